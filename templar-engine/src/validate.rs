//! Template validation and repository discovery.
//!
//! Validation never fails the scan: every problem becomes a diagnostic and
//! at worst excludes the offending template. A malformed descriptor is fatal
//! for its repository only.

use std::collections::BTreeSet;
use std::path::Path;

use templar_core::descriptor::load_descriptor;
use templar_core::diagnostics::Diagnostics;
use templar_core::error::DescriptorError;
use templar_core::types::{Repository, Template};
use templar_lang::script::has_script_extension;
use templar_lang::{compile, load_function, parse_expression, ScriptFunction};

/// A validated template with its script function (if any) already loaded.
#[derive(Debug, Clone)]
pub struct LoadedTemplate {
    pub template: Template,
    /// Present only when the descriptor names a `variables_script`.
    pub variables_fn: Option<ScriptFunction>,
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Scan every configured repository and collect the valid templates.
///
/// Duplicate names within one repository keep the first declaration; the
/// same name across repositories is kept in both (disambiguated by the
/// attached repository identity).
pub fn discover_templates(
    repositories: &[Repository],
    diagnostics: &mut Diagnostics,
) -> Vec<LoadedTemplate> {
    let mut loaded = Vec::new();
    for repo in repositories {
        if !repo.exists() {
            diagnostics.warning(
                &repo.id,
                format!("repository path {} does not exist; skipping", repo.path.display()),
            );
            continue;
        }
        let descriptor = match load_descriptor(&repo.path) {
            Ok(descriptor) => descriptor,
            // A repository without a descriptor offers no templates; that is
            // unremarkable, unlike a descriptor that fails to read or parse.
            Err(e @ DescriptorError::Missing { .. }) => {
                diagnostics.info(&repo.id, e.to_string());
                continue;
            }
            Err(e) => {
                diagnostics.error(&repo.id, e.to_string());
                continue;
            }
        };

        let mut seen = BTreeSet::new();
        for raw in descriptor.templates {
            if !seen.insert(raw.name.0.clone()) {
                diagnostics.warning(
                    &repo.id,
                    format!(
                        "duplicate template name '{}' — keeping the first declaration",
                        raw.name
                    ),
                );
                continue;
            }
            if let Some(template) = validate_template(raw, repo, diagnostics) {
                loaded.push(template);
            }
        }
    }
    tracing::debug!(
        "discovered {} template(s) across {} repositor(ies)",
        loaded.len(),
        repositories.len()
    );
    loaded
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate one raw descriptor entry against its repository.
///
/// Returns the decorated [`LoadedTemplate`] on success; on failure the
/// template is dropped and the reason is recorded in `diagnostics`.
pub fn validate_template(
    mut template: Template,
    repo: &Repository,
    diagnostics: &mut Diagnostics,
) -> Option<LoadedTemplate> {
    let name = template.name.to_string();

    if name.trim().is_empty() {
        diagnostics.error(&repo.id, "template with empty name skipped");
        return None;
    }
    if template.files.is_empty() {
        diagnostics.error(&repo.id, format!("template '{name}' declares no files"));
        return None;
    }

    if !check_sources(&template, repo, diagnostics) {
        return None;
    }
    if !check_parameters(&template, repo, diagnostics) {
        return None;
    }
    if !check_variables(&template, repo, diagnostics) {
        return None;
    }
    let variables_fn = match load_script(&template, repo, diagnostics) {
        Ok(f) => f,
        Err(()) => return None,
    };

    template.directory = Some(repo.path.clone());
    template.repository_id = Some(repo.id.clone());
    template.repository_name = Some(repo.name.clone());
    Some(LoadedTemplate { template, variables_fn })
}

fn check_sources(template: &Template, repo: &Repository, diagnostics: &mut Diagnostics) -> bool {
    let mut ok = true;
    for file in &template.files {
        let source = repo.path.join(&file.source);
        if !source.is_file() {
            diagnostics.warning(
                &repo.id,
                format!(
                    "template '{}': source file {} not found; template skipped",
                    template.name, file.source
                ),
            );
            ok = false;
        }
        if file.destination.trim().is_empty() {
            diagnostics.error(
                &repo.id,
                format!("template '{}': a file has an empty destination", template.name),
            );
            ok = false;
        }
    }
    ok
}

fn check_parameters(template: &Template, repo: &Repository, diagnostics: &mut Diagnostics) -> bool {
    let mut ok = true;
    for param in &template.parameters {
        let label = format!("template '{}', parameter '{}'", template.name, param.name);
        if param.name.trim().is_empty() || param.display_name.trim().is_empty() {
            diagnostics.error(
                &repo.id,
                format!("template '{}': parameter missing name or displayName", template.name),
            );
            ok = false;
            continue;
        }
        if param.kind.needs_options() && param.options.is_empty() {
            diagnostics.error(
                &repo.id,
                format!("{label}: {} parameters need at least one option", param.kind),
            );
            ok = false;
        }
        if let Some(pattern) = &param.pattern {
            if let Err(e) = regex::Regex::new(pattern) {
                diagnostics.error(&repo.id, format!("{label}: invalid pattern: {e}"));
                ok = false;
            }
        }
        if let Some(expr) = &param.visible_if {
            if let Err(e) = parse_expression(expr) {
                diagnostics.error(&repo.id, format!("{label}: invalid visibleIf: {e}"));
                ok = false;
            }
        }
    }
    ok
}

fn check_variables(template: &Template, repo: &Repository, diagnostics: &mut Diagnostics) -> bool {
    let mut ok = true;
    for var in &template.variables {
        let label = format!("template '{}', variable '{}'", template.name, var.name);
        if var.name.trim().is_empty() || var.value.trim().is_empty() {
            diagnostics.error(
                &repo.id,
                format!("template '{}': variable missing name or value", template.name),
            );
            ok = false;
            continue;
        }
        let result = match var.kind {
            // Syntax-only checks; nothing is evaluated during validation.
            templar_core::types::VariableKind::DotJs => compile(&var.value).map(|_| ()),
            templar_core::types::VariableKind::Js => parse_expression(&var.value).map(|_| ()),
        };
        if let Err(e) = result {
            diagnostics.error(&repo.id, format!("{label}: {e}"));
            ok = false;
        }
    }
    ok
}

/// Resolve the template's variables script, if declared.
///
/// Any failure here rejects the template with an informational diagnostic —
/// the template author gets a pointer, the scan moves on.
fn load_script(
    template: &Template,
    repo: &Repository,
    diagnostics: &mut Diagnostics,
) -> Result<Option<ScriptFunction>, ()> {
    let Some(script) = &template.variables_script else {
        return Ok(None);
    };
    let name = &template.name;
    let path = repo.path.join(script);

    if !has_script_extension(Path::new(script)) {
        diagnostics.info(
            &repo.id,
            format!("template '{name}': variables script {script} must use the .vars extension"),
        );
        return Err(());
    }
    if !path.is_file() {
        diagnostics.info(
            &repo.id,
            format!("template '{name}': variables script {script} not found"),
        );
        return Err(());
    }

    let function_name = template.variables_function_name();
    match load_function(&path, function_name) {
        Ok(Some(f)) if f.arity() == 2 => Ok(Some(f)),
        Ok(Some(f)) => {
            diagnostics.info(
                &repo.id,
                format!(
                    "template '{name}': function '{function_name}' takes {} parameter(s), expected 2 (data, context)",
                    f.arity()
                ),
            );
            Err(())
        }
        Ok(None) => {
            diagnostics.info(
                &repo.id,
                format!("template '{name}': script {script} defines no function '{function_name}'"),
            );
            Err(())
        }
        Err(e) => {
            diagnostics.info(&repo.id, format!("template '{name}': {e}"));
            Err(())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use templar_core::diagnostics::DiagnosticLevel;
    use tempfile::TempDir;

    fn repo_at(root: &Path) -> Repository {
        Repository {
            id: "main".into(),
            name: "Main templates".into(),
            path: root.to_path_buf(),
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
        std::fs::write(path, content).expect("write");
    }

    fn parse_template(json: &str) -> Template {
        serde_json::from_str(json).expect("template json")
    }

    const MINIMAL: &str = r#"{
        "name": "api",
        "files": [{"source": "src/main.txt", "destination": "main.rs"}]
    }"#;

    #[test]
    fn minimal_template_validates() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "src/main.txt", "fn main() {}");
        let mut diags = Diagnostics::new();

        let loaded = validate_template(parse_template(MINIMAL), &repo_at(dir.path()), &mut diags)
            .expect("valid");
        assert!(diags.is_empty());
        assert!(loaded.variables_fn.is_none());
        assert_eq!(loaded.template.directory.as_deref(), Some(dir.path()));
        assert_eq!(loaded.template.repository_name.as_deref(), Some("Main templates"));
    }

    #[test]
    fn missing_source_rejects_with_warning() {
        let dir = TempDir::new().expect("tempdir");
        let mut diags = Diagnostics::new();
        let result = validate_template(parse_template(MINIMAL), &repo_at(dir.path()), &mut diags);
        assert!(result.is_none());
        assert_eq!(diags.entries()[0].level, DiagnosticLevel::Warning);
    }

    #[test]
    fn no_files_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let mut diags = Diagnostics::new();
        let raw = parse_template(r#"{"name": "empty", "files": []}"#);
        assert!(validate_template(raw, &repo_at(dir.path()), &mut diags).is_none());
        assert!(diags.has_errors());
    }

    #[test]
    fn selection_without_options_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "a.txt", "x");
        let raw = parse_template(
            r#"{
                "name": "api",
                "files": [{"source": "a.txt", "destination": "a.txt"}],
                "parameters": [{"name": "db", "displayName": "Database", "type": "selection"}]
            }"#,
        );
        let mut diags = Diagnostics::new();
        assert!(validate_template(raw, &repo_at(dir.path()), &mut diags).is_none());
        assert!(diags.has_errors());
    }

    #[test]
    fn bad_pattern_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "a.txt", "x");
        let raw = parse_template(
            r#"{
                "name": "api",
                "files": [{"source": "a.txt", "destination": "a.txt"}],
                "parameters": [{
                    "name": "name", "displayName": "Name",
                    "type": "string", "pattern": "[unclosed"
                }]
            }"#,
        );
        let mut diags = Diagnostics::new();
        assert!(validate_template(raw, &repo_at(dir.path()), &mut diags).is_none());
        assert!(diags.has_errors());
    }

    #[test]
    fn bad_dotjs_variable_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "a.txt", "x");
        let raw = parse_template(
            r#"{
                "name": "api",
                "files": [{"source": "a.txt", "destination": "a.txt"}],
                "variables": [{"name": "v", "value": "{{= data.x", "type": "dotjs"}]
            }"#,
        );
        let mut diags = Diagnostics::new();
        assert!(validate_template(raw, &repo_at(dir.path()), &mut diags).is_none());
        assert!(diags.has_errors());
    }

    #[test]
    fn script_with_wrong_arity_rejects_with_info() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "a.txt", "x");
        write(dir.path(), "gen.vars", "fn generateVariables(data) { return {}; }");
        let raw = parse_template(
            r#"{
                "name": "api",
                "files": [{"source": "a.txt", "destination": "a.txt"}],
                "variablesScript": "gen.vars"
            }"#,
        );
        let mut diags = Diagnostics::new();
        assert!(validate_template(raw, &repo_at(dir.path()), &mut diags).is_none());
        assert_eq!(diags.entries()[0].level, DiagnosticLevel::Info);
        assert!(!diags.has_errors());
    }

    #[test]
    fn script_function_is_attached() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "a.txt", "x");
        write(
            dir.path(),
            "gen.vars",
            "fn generateVariables(data, context) { return {}; }",
        );
        let raw = parse_template(
            r#"{
                "name": "api",
                "files": [{"source": "a.txt", "destination": "a.txt"}],
                "variablesScript": "gen.vars"
            }"#,
        );
        let mut diags = Diagnostics::new();
        let loaded = validate_template(raw, &repo_at(dir.path()), &mut diags).expect("valid");
        assert!(diags.is_empty());
        assert_eq!(loaded.variables_fn.expect("function").arity(), 2);
    }

    #[test]
    fn wrong_script_extension_rejects() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "a.txt", "x");
        write(dir.path(), "gen.js", "fn generateVariables(data, context) { return {}; }");
        let raw = parse_template(
            r#"{
                "name": "api",
                "files": [{"source": "a.txt", "destination": "a.txt"}],
                "variablesScript": "gen.js"
            }"#,
        );
        let mut diags = Diagnostics::new();
        assert!(validate_template(raw, &repo_at(dir.path()), &mut diags).is_none());
    }

    // -- discovery ----------------------------------------------------------

    fn write_descriptor(root: &Path, body: &str) {
        write(root, "templates.json", body);
    }

    #[test]
    fn discovery_skips_missing_repository_with_warning() {
        let missing = Repository {
            id: "gone".into(),
            name: "Gone".into(),
            path: "/nonexistent/templar-test".into(),
        };
        let mut diags = Diagnostics::new();
        let loaded = discover_templates(&[missing], &mut diags);
        assert!(loaded.is_empty());
        assert_eq!(diags.entries()[0].level, DiagnosticLevel::Warning);
    }

    #[test]
    fn repository_without_descriptor_is_informational() {
        let empty = TempDir::new().expect("tempdir");
        let mut diags = Diagnostics::new();
        let loaded = discover_templates(&[repo_at(empty.path())], &mut diags);

        assert!(loaded.is_empty());
        assert_eq!(diags.entries()[0].level, DiagnosticLevel::Info);
        assert!(!diags.has_errors(), "a descriptorless repository is not a failure");
    }

    #[test]
    fn malformed_descriptor_is_fatal_per_repository() {
        let bad = TempDir::new().expect("tempdir");
        write_descriptor(bad.path(), "{not json");
        let good = TempDir::new().expect("tempdir");
        write(good.path(), "a.txt", "x");
        write_descriptor(
            good.path(),
            r#"{"templates": [{"name": "api", "files": [
                {"source": "a.txt", "destination": "a.txt"}
            ]}]}"#,
        );

        let repos = vec![
            Repository { id: "bad".into(), name: "Bad".into(), path: bad.path().into() },
            Repository { id: "good".into(), name: "Good".into(), path: good.path().into() },
        ];
        let mut diags = Diagnostics::new();
        let loaded = discover_templates(&repos, &mut diags);

        assert_eq!(loaded.len(), 1, "good repository must be unaffected");
        assert!(diags.has_errors());
        assert_eq!(diags.entries()[0].repository_id, "bad".into());
    }

    #[test]
    fn duplicate_names_keep_first_with_warning() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "a.txt", "x");
        write(dir.path(), "b.txt", "y");
        write_descriptor(
            dir.path(),
            r#"{"templates": [
                {"name": "api", "description": "first",
                 "files": [{"source": "a.txt", "destination": "a.txt"}]},
                {"name": "api", "description": "second",
                 "files": [{"source": "b.txt", "destination": "b.txt"}]}
            ]}"#,
        );
        let mut diags = Diagnostics::new();
        let loaded = discover_templates(&[repo_at(dir.path())], &mut diags);

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].template.description, "first");
        assert_eq!(diags.entries()[0].level, DiagnosticLevel::Warning);
    }

    #[test]
    fn same_name_across_repositories_is_kept_in_both() {
        let mk = |desc: &str| {
            let dir = TempDir::new().expect("tempdir");
            write(dir.path(), "a.txt", "x");
            write_descriptor(
                dir.path(),
                &format!(
                    r#"{{"templates": [{{"name": "api", "description": "{desc}",
                        "files": [{{"source": "a.txt", "destination": "a.txt"}}]}}]}}"#
                ),
            );
            dir
        };
        let one = mk("one");
        let two = mk("two");
        let repos = vec![
            Repository { id: "one".into(), name: "One".into(), path: one.path().into() },
            Repository { id: "two".into(), name: "Two".into(), path: two.path().into() },
        ];
        let mut diags = Diagnostics::new();
        let loaded = discover_templates(&repos, &mut diags);
        assert_eq!(loaded.len(), 2);
        assert!(diags.is_empty());
    }
}
