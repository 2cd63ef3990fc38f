// API signature database
//
// Parses the textual public API listing (`current.txt` style) into lookup
// tables used to filter extracted and imported annotations down to the
// public API surface.

use miette::{IntoDiagnostic, Result, WrapErr};
use regex::Regex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

const MODIFIERS: &str = r"((deprecated|public|static|private|protected|final|abstract|\s*)\s+)*";

struct Patterns {
    package: Regex,
    class: Regex,
    method: Regex,
    ctor: Regex,
    field: Regex,
}

impl Patterns {
    fn new() -> Self {
        let compile = |pattern: String| Regex::new(&pattern).unwrap();
        Self {
            package: compile(r"^package (\S+) \{$".to_string()),
            class: compile(format!(
                r"^{}(class|interface|enum)\s+(\S+)\s+(extends (.+))?(implements (.+))?(.*)\{{$",
                MODIFIERS
            )),
            method: compile(format!(r"^(method|ctor)\s+{}(.+)??\s+(\S+)\s*\((.*)\)(.*);$", MODIFIERS)),
            ctor: compile(r"^(method|ctor)\s+.*\((.*)\)(.*);$".to_string()),
            field: compile(format!(r"^(enum_constant|field)\s+{}(.+)\s+(\S+)\s*;$", MODIFIERS)),
        }
    }
}

/// Lookup tables over a public API signature listing
#[derive(Debug, Default)]
pub struct ApiDatabase {
    /// class -> field names
    fields: HashMap<String, HashSet<String>>,
    /// class -> int typed field names
    int_fields: HashMap<String, BTreeSet<String>>,
    /// raw class -> raw member name -> parameter lists
    methods: HashMap<String, HashMap<String, Vec<String>>>,
    /// raw class -> super types as written
    inherits_from: HashMap<String, Vec<String>>,
    classes: HashSet<String>,
}

impl ApiDatabase {
    /// Build the database from the lines of one or more API files
    pub fn new<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut db = Self::default();
        db.read_api(lines);
        debug!(
            "API database: {} classes, {} with methods, {} with fields",
            db.classes.len(),
            db.methods.len(),
            db.fields.len()
        );
        db
    }

    /// Read and concatenate several API files
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut lines = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let contents = std::fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to read API file: {}", path.display()))?;
            lines.extend(contents.lines().map(str::to_string));
        }
        Ok(Self::new(&lines))
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes.contains(class_name)
    }

    pub fn has_field(&self, class_name: &str, field_name: &str) -> bool {
        let mut visited = HashSet::new();
        self.has_field_in(class_name, field_name, &mut visited)
    }

    fn has_field_in<'a>(&'a self, class_name: &'a str, field_name: &str, visited: &mut HashSet<&'a str>) -> bool {
        if !visited.insert(class_name) {
            return false;
        }
        if self
            .fields
            .get(class_name)
            .is_some_and(|fields| fields.contains(field_name))
        {
            return true;
        }
        match self.inherits_from.get(class_name) {
            Some(supers) => supers.iter().any(|s| self.has_field_in(s, field_name, visited)),
            None => false,
        }
    }

    /// Whether `class_name` (or one of its super types) declares the method.
    /// All three parts are normalized to their raw forms before the lookup.
    pub fn has_method(&self, class_name: &str, method_name: &str, parameters: &str) -> bool {
        let method_name = raw_method(method_name);
        let parameters = raw_parameter_list(parameters);
        let mut visited = HashSet::new();
        self.has_method_in(&raw_class(class_name), method_name, &parameters, &mut visited)
    }

    fn has_method_in(&self, class_name: &str, method_name: &str, parameters: &str, visited: &mut HashSet<String>) -> bool {
        if !visited.insert(class_name.to_string()) {
            return false;
        }
        let found = self
            .methods
            .get(class_name)
            .and_then(|members| members.get(method_name))
            .is_some_and(|signatures| signatures.iter().any(|s| s == parameters));
        if found {
            return true;
        }
        match self.inherits_from.get(class_name) {
            Some(supers) => supers
                .iter()
                .any(|s| self.has_method_in(&raw_class(s), method_name, parameters, visited)),
            None => false,
        }
    }

    /// Int typed fields declared directly in `class_name`, sorted by name
    pub fn declared_int_fields(&self, class_name: &str) -> Option<&BTreeSet<String>> {
        self.int_fields.get(class_name)
    }

    fn read_api<S: AsRef<str>>(&mut self, lines: &[S]) {
        let patterns = Patterns::new();
        let mut current_package: Option<String> = None;
        let mut current_class: Option<String> = None;

        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() || line == "}" {
                continue;
            }

            if line.starts_with("method ") {
                match (patterns.method.captures(line), current_class.as_deref()) {
                    (Some(caps), Some(class)) => {
                        let name = caps.get(5).map_or("", |m| m.as_str());
                        let signature = caps.get(6).map_or("", |m| m.as_str());
                        self.add_method(class, &[name], signature);
                    }
                    _ => warn!("Did not match as a member: {}", line),
                }
            } else if line.starts_with("ctor ") {
                match (patterns.ctor.captures(line), current_class.clone()) {
                    (Some(caps), Some(class)) => {
                        let simple = class.rsplit('.').next().unwrap_or(&class).to_string();
                        let signature = caps.get(2).map_or("", |m| m.as_str());
                        self.add_method(&class, &[&class, &simple], signature);
                    }
                    _ => warn!("Did not match as a member: {}", line),
                }
            } else if line.starts_with("enum_constant ") || line.starts_with("field ") {
                let line = normalize_field_line(line);
                match (patterns.field.captures(&line), current_class.as_deref()) {
                    (Some(caps), Some(class)) => {
                        let field_type = caps.get(4).map_or("", |m| m.as_str());
                        let name = caps.get(5).map_or("", |m| m.as_str());
                        self.add_field(class, name, field_type == "int");
                    }
                    _ => warn!("Did not match as a member: {}", line),
                }
            } else if line.starts_with("package ") {
                match patterns.package.captures(line) {
                    Some(caps) => current_package = caps.get(1).map(|m| m.as_str().to_string()),
                    None => warn!("Did not match as a package: {}", line),
                }
            } else {
                match patterns.class.captures(line) {
                    Some(caps) => {
                        let name = caps.get(4).map_or("", |m| m.as_str());
                        let class = match &current_package {
                            Some(package) => format!("{}.{}", package, name),
                            None => name.to_string(),
                        };
                        self.classes.insert(raw_class(&class));
                        self.classes.insert(class.clone());

                        if let Some(super_class) = caps.get(6) {
                            // `extends` is greedy and may have swallowed the implements list
                            for from in super_class.as_str().split(' ').map(str::trim).filter(|s| !s.is_empty()) {
                                if from != "implements" {
                                    self.add_inherits_from(&class, from);
                                }
                            }
                            self.add_inherits_from(&class, super_class.as_str().trim());
                        }
                        if let Some(interfaces) = caps.get(8) {
                            for from in interfaces.as_str().split(' ').map(str::trim).filter(|s| !s.is_empty()) {
                                self.add_inherits_from(&class, from);
                            }
                        }
                        current_class = Some(class);
                    }
                    None => warn!("Did not match as a class/interface: {}", line),
                }
            }
        }
    }

    fn add_method(&mut self, class: &str, names: &[&str], signature: &str) {
        let signature: String = signature.trim().chars().filter(|c| *c != ' ' && *c != '\u{a0}').collect();

        let mut variants = vec![signature.clone()];
        if let Some(stem) = signature.strip_suffix("...") {
            variants.push(format!("{}[]", stem));
        } else if signature.ends_with("[]") && !signature.ends_with("[][]") {
            variants.push(format!("{}...", &signature[..signature.len() - 2]));
        }
        variants.push(raw_parameter_list(&signature));

        let members = self.methods.entry(raw_class(class)).or_default();
        for name in names {
            let list = members.entry(raw_method(name).to_string()).or_default();
            for variant in &variants {
                if !list.contains(variant) {
                    list.push(variant.clone());
                }
            }
        }
    }

    fn add_field(&mut self, class: &str, name: &str, is_int: bool) {
        for key in [class.to_string(), raw_class(class)] {
            self.fields.entry(key.clone()).or_default().insert(name.to_string());
            if is_int {
                self.int_fields.entry(key).or_default().insert(name.to_string());
            }
        }
    }

    fn add_inherits_from(&mut self, class: &str, from: &str) {
        self.inherits_from
            .entry(raw_class(class))
            .or_default()
            .push(from.to_string());
    }
}

/// Strip a constant value and anything after the terminating semicolon
fn normalize_field_line(line: &str) -> String {
    if let Some(equals) = line.find('=') {
        let head = line[..equals].trim();
        if head.contains(';') {
            head.to_string()
        } else {
            format!("{};", head)
        }
    } else if !line.ends_with(';') {
        match line.find(';') {
            Some(semi) => line[..=semi].to_string(),
            None => line.to_string(),
        }
    } else {
        line.to_string()
    }
}

/// Drop generic type variables from a class name, keeping any nested
/// suffix: `pkg.Adapter<T>.Inner` becomes `pkg.Adapter.Inner`.
pub fn raw_class(name: &str) -> String {
    let Some(index) = name.find('<') else {
        return name.to_string();
    };
    match name[index + 1..].find('>').map(|end| index + 1 + end) {
        Some(end) if end != name.len() - 1 => format!("{}{}", &name[..index], &name[end + 1..]),
        _ => name[..index].to_string(),
    }
}

/// Drop generic type variables from a method or constructor name
pub fn raw_method(name: &str) -> &str {
    match name.find('<') {
        Some(index) => &name[..index],
        None => name,
    }
}

/// Drop every balanced `<...>` group and turn trailing varargs into `[]`.
/// An unbalanced `<` drops the rest of the list.
pub fn raw_parameter_list(signature: &str) -> String {
    if !signature.contains('<') && !signature.ends_with("...") {
        return signature.to_string();
    }

    let mut out = String::with_capacity(signature.len());
    let mut depth = 0usize;
    for c in signature.chars() {
        match c {
            '<' => depth += 1,
            '>' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }

    if out.len() > 3 && out.ends_with("...") {
        out.truncate(out.len() - 3);
        out.push_str("[]");
    }
    out
}
