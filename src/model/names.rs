// Well-known annotation names and the platform -> portable namespace table

pub const SUPPORT_ANNOTATIONS_PREFIX: &str = "android.support.annotation.";
pub const ANDROID_ANNOTATIONS_PREFIX: &str = "android.annotation.";

pub const INT_DEF: &str = "android.support.annotation.IntDef";
pub const STRING_DEF: &str = "android.support.annotation.StringDef";
pub const INT_RANGE: &str = "android.support.annotation.IntRange";
pub const REQUIRES_PERMISSION: &str = "android.support.annotation.RequiresPermission";
pub const SUPPORT_KEEP: &str = "android.support.annotation.Keep";
pub const SUPPORT_NULLABLE: &str = "android.support.annotation.Nullable";
pub const SUPPORT_NOTNULL: &str = "android.support.annotation.NonNull";

pub const ANDROID_INT_DEF: &str = "android.annotation.IntDef";
pub const ANDROID_STRING_DEF: &str = "android.annotation.StringDef";
pub const ANDROID_INT_RANGE: &str = "android.annotation.IntRange";
pub const ANDROID_REQUIRES_PERMISSION: &str = "android.annotation.RequiresPermission";
pub const ANDROID_NULLABLE: &str = "android.annotation.Nullable";
pub const ANDROID_NOTNULL: &str = "android.annotation.NonNull";

pub const IDEA_NULLABLE: &str = "org.jetbrains.annotations.Nullable";
pub const IDEA_NOTNULL: &str = "org.jetbrains.annotations.NotNull";
pub const IDEA_MAGIC: &str = "org.intellij.lang.annotations.MagicConstant";
pub const IDEA_CONTRACT: &str = "org.jetbrains.annotations.Contract";
pub const IDEA_NON_NLS: &str = "org.jetbrains.annotations.NonNls";

/// Suffix shared by the resource type annotations (`@StringRes`, `@DrawableRes`, ...)
pub const RESOURCE_TYPE_SUFFIX: &str = "Res";

pub const ATTR_VALUE: &str = "value";
pub const ATTR_FLAG: &str = "flag";
pub const ATTR_NAME: &str = "name";
pub const ATTR_VAL: &str = "val";
pub const VALUE_TRUE: &str = "true";

/// Annotations that may sit on a typedef declaration and get copied onto
/// every element using that typedef.
const NESTED_ANNOTATIONS: &[&str] = &[
    INT_DEF,
    ANDROID_INT_DEF,
    STRING_DEF,
    ANDROID_STRING_DEF,
    REQUIRES_PERMISSION,
    ANDROID_REQUIRES_PERMISSION,
    INT_RANGE,
    ANDROID_INT_RANGE,
];

pub fn is_nested_annotation(name: &str) -> bool {
    NESTED_ANNOTATIONS.contains(&name)
}

/// Builtin typedef containers, i.e. annotations that define a set of
/// permitted constants by themselves.
pub fn is_builtin_container(name: &str) -> bool {
    matches!(
        name,
        INT_DEF | ANDROID_INT_DEF | STRING_DEF | ANDROID_STRING_DEF | INT_RANGE | ANDROID_INT_RANGE
    )
}

pub fn is_nullable(name: &str) -> bool {
    matches!(name, IDEA_NULLABLE | ANDROID_NULLABLE | SUPPORT_NULLABLE)
}

pub fn is_non_null(name: &str) -> bool {
    matches!(name, IDEA_NOTNULL | ANDROID_NOTNULL | SUPPORT_NOTNULL)
}

/// Translation table between the platform-internal annotation namespace and
/// the portable support namespace.
#[derive(Debug, Clone)]
pub struct NamespaceMap {
    pub platform_prefix: String,
    pub portable_prefix: String,
    pub nullable: (String, String),
    pub non_null: (String, String),
    /// Platform annotations that have no portable counterpart
    pub excluded_suffixes: Vec<String>,
}

impl Default for NamespaceMap {
    fn default() -> Self {
        Self {
            platform_prefix: ANDROID_ANNOTATIONS_PREFIX.to_string(),
            portable_prefix: SUPPORT_ANNOTATIONS_PREFIX.to_string(),
            nullable: (ANDROID_NULLABLE.to_string(), SUPPORT_NULLABLE.to_string()),
            non_null: (ANDROID_NOTNULL.to_string(), SUPPORT_NOTNULL.to_string()),
            excluded_suffixes: [".Widget", ".TargetApi", ".SystemApi", ".SuppressLint", ".SdkConstant"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl NamespaceMap {
    pub fn is_platform(&self, name: &str) -> bool {
        name.starts_with(&self.platform_prefix)
    }

    pub fn is_portable(&self, name: &str) -> bool {
        name.starts_with(&self.portable_prefix)
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded_suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }

    /// Rewrite a platform name into the portable namespace. Names outside the
    /// platform namespace are returned unchanged.
    pub fn to_portable(&self, name: &str) -> String {
        if name == self.nullable.0 {
            return self.nullable.1.clone();
        }
        if name == self.non_null.0 {
            return self.non_null.1.clone();
        }
        match name.strip_prefix(self.platform_prefix.as_str()) {
            Some(rest) => format!("{}{}", self.portable_prefix, rest),
            None => name.to_string(),
        }
    }
}
