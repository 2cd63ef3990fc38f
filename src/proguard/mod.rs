// ProGuard/R8 integration
//
// Elements annotated with @Keep are not written to the annotations archive;
// they become -keep rules in a ProGuard configuration file instead.

mod keep_rules;

pub use keep_rules::{render_keep_rules, write_keep_rules};
