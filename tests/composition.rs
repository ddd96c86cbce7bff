//! End-to-end composition tests against template directories on disk

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

use template_composer::{
    CacheMode, ComposeError, Composer, ComposerConfig, ExecError, TemplateError,
};

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(path, text).expect("write");
}

/// A small site: two layouts, views with partials nested inside, and a
/// `define` shared between partial files
fn site() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    write(
        root,
        "layouts/main.tmpl",
        r#"<title>{{block "title" .}}Site{{end}}</title>{{template "header" .}}<main>{{template "profile" .}}</main>{{template "footer"}}"#,
    );
    write(root, "layouts/bare.tmpl", r#"{{template "profile" .}}"#);
    write(
        root,
        "views/profile.tmpl",
        r#"{{define "title"}}{{ .User.Name }}'s profile{{end}}Hello {{ .User.Name }}{{template "sidebar" .}}"#,
    );
    write(root, "views/settings.tmpl", r#"Settings{{template "missing-partial"}}"#);
    write(root, "views/partials/header.tmpl", r#"<h1>{{template "brand"}}</h1>"#);
    write(root, "views/partials/footer.tmpl", r#"{{template "brand"}} (c)"#);
    write(root, "views/partials/sidebar.tmpl", "[sidebar]");
    write(root, "views/partials/shared.tmpl", r#"{{define "brand"}}ACME{{end}}"#);
    write(root, "views/partials/README.md", "not a template");
    dir
}

fn config(root: &Path) -> ComposerConfig {
    ComposerConfig::new()
        .with_layouts_dir(root.join("layouts"))
        .with_views_dir(root.join("views"))
        .with_partials_dir(root.join("views/partials"))
        .with_template_ext(".tmpl")
        .with_strip_ext(true)
}

#[test]
fn test_full_site_composition() {
    let dir = site();
    let composer = Composer::new(config(dir.path())).expect("Should load");

    let out = composer
        .render("base=main,profile", &json!({"User": {"Name": "Ada"}}))
        .expect("Should render");

    assert_eq!(
        out,
        "<title>Ada's profile</title><h1>ACME</h1><main>Hello Ada[sidebar]</main>ACME (c)"
    );
}

#[test]
fn test_explained_members() {
    let dir = site();
    let composer = Composer::new(config(dir.path())).expect("Should load");

    let composition = composer.compose("base=main,profile").expect("Should compose");
    let members = composition.set.names().collect::<Vec<_>>().join(",");

    insta::assert_snapshot!(members, @"main,title,profile,header,footer,brand,sidebar");
    // The view's own "title" definition is grafted along with the view
    assert_eq!(composition.resolution.associated, vec!["title", "profile"]);
    assert!(composition.resolution.defaulted.is_empty());
}

#[test]
fn test_block_default_without_override() {
    let dir = site();
    write(dir.path(), "views/plain.tmpl", "plain");
    write(
        dir.path(),
        "layouts/titled.tmpl",
        r#"{{block "title" .}}Site{{end}}: {{template "plain"}}"#,
    );
    let composer = Composer::new(config(dir.path())).expect("Should load");

    let out = composer.render("base=titled,plain", &json!({})).expect("Should render");
    insta::assert_snapshot!(out, @"Site: plain");
}

#[test]
fn test_last_base_wins() {
    let dir = site();
    let composer = Composer::new(config(dir.path())).expect("Should load");

    let out = composer
        .render("base=main,profile,base=bare", &json!({"User": {"Name": "Bo"}}))
        .expect("Should render");
    assert_eq!(out, "Hello Bo[sidebar]");
}

#[test]
fn test_default_layout_from_config() {
    let dir = site();
    let composer = Composer::new(config(dir.path()).with_default_layout("bare"))
        .expect("Should load");

    let out = composer
        .render("profile", &json!({"User": {"Name": "Cy"}}))
        .expect("Should render");
    assert_eq!(out, "Hello Cy[sidebar]");
}

#[test]
fn test_missing_partial_writes_nothing() {
    let dir = site();
    let composer = Composer::new(config(dir.path())).expect("Should load");

    let mut out = Vec::new();
    let err = composer
        .execute(&mut out, "base=,settings", &json!({}))
        .unwrap_err();

    match err {
        ComposeError::Template(TemplateError::Missing {
            name,
            referenced_by,
        }) => {
            assert_eq!(name, "missing-partial");
            assert_eq!(referenced_by.as_deref(), Some("settings"));
        }
        other => panic!("Expected Missing, got {:?}", other),
    }
    assert!(out.is_empty());
}

#[test]
fn test_content_outranks_partials() {
    let dir = site();
    write(dir.path(), "layouts/side.tmpl", r#"{{template "custom"}}|{{template "sidebar"}}"#);
    write(dir.path(), "views/custom.tmpl", r#"C{{define "sidebar"}}[custom]{{end}}"#);
    let composer = Composer::new(config(dir.path())).expect("Should load");

    let out = composer.render("base=side,custom", &json!({})).expect("Should render");
    assert_eq!(out, "C|[custom]");
}

#[test]
fn test_nested_partials_are_not_views() {
    let dir = site();
    let composer = Composer::new(config(dir.path())).expect("Should load");

    let err = composer.compose("base=,partials/header").unwrap_err();
    assert!(matches!(err, TemplateError::Missing { name, .. } if name == "partials/header"));

    // The partial itself is still reachable as content through the partials pool
    let out = composer.render("base=,header", &json!({})).expect("Should render");
    assert_eq!(out, "<h1>ACME</h1>");
}

#[test]
fn test_execution_cycle_hits_recursion_limit() {
    let dir = site();
    write(dir.path(), "views/loop.tmpl", r#"{{template "ping"}}"#);
    write(dir.path(), "views/partials/ping.tmpl", r#"{{template "pong"}}"#);
    write(dir.path(), "views/partials/pong.tmpl", r#"{{template "ping"}}"#);
    let composer = Composer::new(config(dir.path())).expect("Should load");

    let err = composer.render("base=,loop", &json!({})).unwrap_err();
    assert!(matches!(err, ComposeError::Exec(ExecError::RecursionLimit { .. })));
}

#[test]
fn test_missing_key_error_option() {
    let dir = site();
    let composer = Composer::new(config(dir.path()).with_option("missingkey=error"))
        .expect("Should load");

    let err = composer.render("base=bare,profile", &json!({})).unwrap_err();
    assert!(matches!(
        err,
        ComposeError::Exec(ExecError::MissingKey { ref path, .. }) if path == ".User.Name"
    ));
}

#[test]
fn test_invalid_option_rejected_at_startup() {
    let result = Composer::new(ComposerConfig::new().with_option("missingkey=never"));
    assert!(matches!(result, Err(ComposeError::Config(_))));
}

#[test]
fn test_preload_sees_changes_only_after_reload() {
    let dir = site();
    let mut composer = Composer::new(config(dir.path())).expect("Should load");
    let data = json!({"User": {"Name": "Di"}});

    write(dir.path(), "views/partials/sidebar.tmpl", "[changed]");
    let out = composer.render("base=bare,profile", &data).expect("Should render");
    assert_eq!(out, "Hello Di[sidebar]");

    composer.reload().expect("Should reload");
    let out = composer.render("base=bare,profile", &data).expect("Should render");
    assert_eq!(out, "Hello Di[changed]");
}

#[test]
fn test_dynamic_mode_rereads_each_call() {
    let dir = site();
    let composer = Composer::new(config(dir.path()).with_cache_mode(CacheMode::None))
        .expect("Should build");
    let data = json!({"User": {"Name": "Ed"}});

    let out = composer.render("base=bare,profile", &data).expect("Should render");
    assert_eq!(out, "Hello Ed[sidebar]");

    write(dir.path(), "views/partials/sidebar.tmpl", "[changed]");
    write(dir.path(), "views/profile.tmpl", r#"Hi {{ .User.Name }}{{template "sidebar"}}"#);
    let out = composer.render("base=bare,profile", &data).expect("Should render");
    assert_eq!(out, "Hi Ed[changed]");
}

#[test]
fn test_dynamic_and_preload_agree() {
    let dir = site();
    let data = json!({"User": {"Name": "Flo"}});
    let preload = Composer::new(config(dir.path())).expect("Should load");
    let dynamic = Composer::new(config(dir.path()).with_cache_mode(CacheMode::None))
        .expect("Should build");

    for request in ["base=main,profile", "base=bare,profile", "base=,header"] {
        assert_eq!(
            preload.render(request, &data).expect("preload"),
            dynamic.render(request, &data).expect("dynamic"),
            "request {}",
            request
        );
    }
}

#[test]
fn test_config_file_relative_dirs() {
    let dir = site();
    write(
        dir.path(),
        "composer.toml",
        r#"
layouts_dir = "layouts"
views_dir = "views"
partials_dir = "views/partials"
template_ext = "tmpl"
strip_ext = true
default_layout = "bare"
"#,
    );
    let config =
        ComposerConfig::from_file(&dir.path().join("composer.toml")).expect("Should parse");
    let composer = Composer::new(config).expect("Should load");

    let out = composer
        .render("profile", &json!({"User": {"Name": "Gil"}}))
        .expect("Should render");
    assert_eq!(out, "Hello Gil[sidebar]");
}

#[test]
fn test_custom_delimiters() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "views/page.html", r#"{{ literal }} [[template "part" .]]"#);
    write(dir.path(), "partials/part.html", "[[ .X ]]");
    let config = ComposerConfig::new()
        .with_views_dir(dir.path().join("views"))
        .with_partials_dir(dir.path().join("partials"))
        .with_template_ext(".html")
        .with_strip_ext(true)
        .with_delims("[[", "]]");
    let composer = Composer::new(config).expect("Should load");

    let out = composer.render("base=,page", &json!({"X": 1})).expect("Should render");
    assert_eq!(out, "{{ literal }} 1");
}
