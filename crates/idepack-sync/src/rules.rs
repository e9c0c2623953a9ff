//! Rule template rendering

use std::path::{Component, Path};

use idepack_core::{IoContext, Values, placeholder};
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::mcp::MANAGED_PREFIX;

/// A rendered rule file, ready to be written into an IDE's rules directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFile {
    pub name: String,
    pub content: String,
}

/// Output file name for a package's rule template
///
/// `rules/go/style.mdc` of package `go` becomes `idepack-go-go-style.mdc`.
/// The managed prefix makes the file removable on the next sync, the
/// package name prevents collisions between packages.
pub fn rule_file_name(pack: &str, rel_path: &str) -> Result<String> {
    let unsafe_path = || SyncError::UnsafeRulePath {
        pack: pack.to_string(),
        path: rel_path.to_string(),
    };

    let mut parts = Vec::new();
    for component in Path::new(rel_path).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str().ok_or_else(unsafe_path)?),
            Component::CurDir => {}
            _ => return Err(unsafe_path()),
        }
    }
    if parts.first() == Some(&"rules") && parts.len() > 1 {
        parts.remove(0);
    }
    if parts.is_empty() {
        return Err(unsafe_path());
    }

    Ok(format!("{MANAGED_PREFIX}{pack}-{}", parts.join("-")))
}

/// Read each declared rule template under `root` and substitute `vars`
pub fn render_rules(pack: &str, root: &Path, rules: &[String], vars: &Values) -> Result<Vec<RuleFile>> {
    let mut files = Vec::with_capacity(rules.len());
    for rel in rules {
        let name = rule_file_name(pack, rel)?;
        let source = root.join(rel);
        let template = std::fs::read_to_string(&source).io_context("read rule template", &source)?;
        debug!(pack, rule = %rel, output = %name, "rendering rule");
        files.push(RuleFile {
            name,
            content: placeholder::replace(&template, vars),
        });
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_rule_file_name() {
        assert_eq!(rule_file_name("go", "rules/style.mdc").unwrap(), "idepack-go-style.mdc");
        assert_eq!(
            rule_file_name("go", "rules/testing/table.mdc").unwrap(),
            "idepack-go-testing-table.mdc"
        );
        assert_eq!(rule_file_name("go", "./intro.md").unwrap(), "idepack-go-intro.md");
        assert_eq!(rule_file_name("go", "rules").unwrap(), "idepack-go-rules");
    }

    #[test]
    fn test_rule_file_name_rejects_escape() {
        for bad in ["../secret.mdc", "/etc/passwd", "rules/../../x", ""] {
            assert!(
                matches!(rule_file_name("go", bad), Err(SyncError::UnsafeRulePath { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_render_rules_substitutes_vars() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("rules")).unwrap();
        std::fs::write(
            dir.path().join("rules/style.mdc"),
            "Use {{style.indent:-4}} spaces, module {{module}}.",
        )
        .unwrap();

        let vars = Values::from_json_value(json!({"module": "example.com/app"}));
        let files = render_rules("go", dir.path(), &["rules/style.mdc".to_string()], &vars).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "idepack-go-style.mdc");
        assert_eq!(files[0].content, "Use 4 spaces, module example.com/app.");
    }

    #[test]
    fn test_render_rules_missing_template() {
        let dir = TempDir::new().unwrap();
        let err = render_rules("go", dir.path(), &["rules/none.mdc".to_string()], &Values::new())
            .unwrap_err();
        assert!(matches!(err, SyncError::Core(ref e) if e.is_not_found()));
    }
}
