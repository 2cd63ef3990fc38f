// Java front end
//
// Files are parsed in parallel into syntax trees; resolution into
// declaration facts then runs sequentially over the whole source set.

mod common;
mod java;
mod resolve;
mod syntax;

pub use java::JavaParser;
pub use resolve::Resolver;
pub use syntax::{
    AnnotationSyntax, Expr, FieldSyntax, Import, Literal, MethodSyntax, ParameterSyntax, ParsedUnit, TypeRef,
    TypeSyntax, WildcardBound,
};

use crate::facts::{CompilationUnit, TypedefFacts};
use miette::{IntoDiagnostic, Result, WrapErr};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Read and parse one Java file
pub fn parse_file(path: &Path) -> Result<ParsedUnit> {
    let source = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    JavaParser::new().parse(path, &source)
}

/// Parse files in parallel. Results keep the order of `paths`.
pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedUnit>> {
    paths.par_iter().map(|path| parse_file(path)).collect()
}

/// Resolve parsed units into declaration facts plus the typedef facts of the
/// whole source set
pub fn build_facts(units: &[ParsedUnit]) -> (Vec<CompilationUnit>, TypedefFacts) {
    let resolver = Resolver::new(units);
    let compilation_units = units.iter().map(|unit| resolver.resolve_unit(unit)).collect();
    (compilation_units, resolver.typedef_facts())
}
