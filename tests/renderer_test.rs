mod common;

use common::{buffer_streams, contents, write_file, Buffer};
use serde_json::json;
use stamp::aliases::{parse_template_args, TemplateAliases};
use stamp::config::Config;
use stamp::error::Error;
use stamp::funcs::FuncMap;
use stamp::metrics::Metrics;
use stamp::namer::{OutputNamer, StaticNamer};
use stamp::renderer::{CancelFlag, MiniJinjaRenderer};
use stamp::template::Template;
use stamp::writer::{SharedWriter, Target};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::TempDir;

fn renderer(context: serde_json::Value) -> MiniJinjaRenderer {
    MiniJinjaRenderer::new(FuncMap::new(), "{{", "}}", &TemplateAliases::new(), context).unwrap()
}

fn stream_template(name: &str, contents: &str, out: &Buffer) -> Template {
    Template {
        name: name.to_string(),
        contents: contents.to_string(),
        target: Some(Target::stream(SharedWriter::new(out.clone()), false)),
        ..Default::default()
    }
}

fn buffer() -> Buffer {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn test_render_against_context() {
    let out = buffer();
    let mut renderer = renderer(json!({"Env": {"USER": "dave"}}));

    renderer.render_template(stream_template("<arg>", "name: {{ Env.USER }}", &out)).unwrap();
    assert_eq!(contents(&out), "name: dave");
}

#[test]
fn test_trailing_newline_is_kept() {
    let out = buffer();
    let mut renderer = renderer(json!({"x": 1}));

    renderer.render_template(stream_template("t", "x={{ x }}\n", &out)).unwrap();
    assert_eq!(contents(&out), "x=1\n");
}

#[test]
fn test_output_is_not_escaped() {
    let out = buffer();
    let mut renderer = renderer(json!({"x": "<b>&</b>"}));

    renderer.render_template(stream_template("page.html", "{{ x }}", &out)).unwrap();
    assert_eq!(contents(&out), "<b>&</b>");
}

#[test]
fn test_undefined_key_is_an_error() {
    let out = buffer();
    let mut renderer = renderer(json!({"Env": {}}));

    let result = renderer.render_template(stream_template("t", "value: {{ Env.MISSING }}", &out));
    assert!(matches!(result, Err(Error::ExecutionError(_))));
    assert_eq!(contents(&out), "");
}

#[test]
fn test_units_share_one_namespace() {
    let out = buffer();
    let mut renderer = renderer(json!({"name": "world"}));
    let templates = vec![
        stream_template("partials/x", "hello {{ name }}", &buffer()),
        stream_template("main", "[{% include 'partials/x' %}]", &out),
    ];
    let mut metrics = Metrics::new();

    renderer.render_templates(templates, &mut metrics).unwrap();
    assert_eq!(contents(&out), "[hello world]");
    assert_eq!(metrics.templates_processed, 2);
    assert_eq!(
        metrics.render_duration.keys().collect::<Vec<_>>(),
        vec!["partials/x", "main"]
    );
}

#[test]
fn test_duplicate_names_are_rejected() {
    let mut renderer = renderer(json!({}));
    let templates = vec![
        stream_template("same", "a", &buffer()),
        stream_template("same", "b", &buffer()),
    ];
    let mut metrics = Metrics::new();

    let result = renderer.render_templates(templates, &mut metrics);
    assert!(matches!(result, Err(Error::RenderError { ref name, .. }) if name == "same"));
    assert_eq!(metrics.templates_processed, 1);
    assert_eq!(metrics.errors, 1);
}

#[test]
fn test_nested_aliases_are_addressable() {
    let temp_dir = TempDir::new().unwrap();
    write_file(temp_dir.path().join("partials/header.t"), "== {{ title }} ==");
    write_file(temp_dir.path().join("footer.t"), "-- end --");
    let args = vec![
        format!("parts={}", temp_dir.path().join("partials").display()),
        format!("footer={}", temp_dir.path().join("footer.t").display()),
    ];
    let nested = parse_template_args(&args).unwrap();
    assert_eq!(nested.keys().collect::<Vec<_>>(), vec!["parts/header.t", "footer"]);

    let out = buffer();
    let mut renderer =
        MiniJinjaRenderer::new(FuncMap::new(), "{{", "}}", &nested, json!({"title": "T"})).unwrap();
    renderer
        .render_template(stream_template(
            "main",
            "{% include 'parts/header.t' %}\n{% include 'footer' %}",
            &out,
        ))
        .unwrap();
    assert_eq!(contents(&out), "== T ==\n-- end --");
}

#[test]
fn test_missing_nested_template() {
    let result = parse_template_args(&["x=/no/such/template".to_string()]);
    assert!(matches!(result, Err(Error::ConfigError(_))));
}

#[test]
fn test_inline_template_functions() {
    let out = buffer();
    let mut renderer = renderer(json!({"name": "dave"}));
    let templates = vec![
        stream_template("greeting", "hi {{ name }}", &buffer()),
        stream_template(
            "main",
            "{{ tpl('<{{ name }}>') }} {{ tmpl.inline('{{ n }}', {'n': 2}) }} {{ tmpl.exec('greeting') }}",
            &out,
        ),
    ];

    renderer.render_templates(templates, &mut Metrics::new()).unwrap();
    assert_eq!(contents(&out), "<dave> 2 hi dave");
}

#[test]
fn test_custom_functions() {
    let mut funcs = FuncMap::new();
    funcs.insert("version".to_string(), minijinja::Value::from("1.2.3"));
    let out = buffer();
    let mut renderer =
        MiniJinjaRenderer::new(funcs, "{{", "}}", &TemplateAliases::new(), json!({})).unwrap();

    renderer.render_template(stream_template("t", "v{{ version }}", &out)).unwrap();
    assert_eq!(contents(&out), "v1.2.3");
}

#[test]
fn test_custom_delimiters() {
    let out = buffer();
    let mut renderer =
        MiniJinjaRenderer::new(FuncMap::new(), "[[", "]]", &TemplateAliases::new(), json!({"x": 1}))
            .unwrap();

    renderer
        .render_template(stream_template("t", "[[ x ]] {{ x }} {% if x %}y{% endif %}{# c #}", &out))
        .unwrap();
    assert_eq!(contents(&out), "1 {{ x }} y");
    assert_eq!(renderer.render_str("inline", "[[ x + 1 ]]").unwrap(), "2");
}

#[test]
fn test_cancel_stops_before_next_template() {
    let flag = CancelFlag::new();
    let mut renderer = renderer(json!({})).with_cancel(flag.clone());
    let first = buffer();
    let templates = vec![
        stream_template("first", "1", &first),
        stream_template("second", "2", &buffer()),
    ];
    flag.cancel();

    let mut metrics = Metrics::new();
    let result = renderer.render_templates(templates, &mut metrics);
    assert!(matches!(result, Err(Error::CancelledError { ref next }) if next == "first"));
    assert_eq!(contents(&first), "");
    assert_eq!(metrics.templates_processed, 0);
}

#[test]
fn test_static_namer_joins_and_cleans() {
    let namer = StaticNamer::new("/out/./dir");
    for (input, expected) in [
        ("a/b", "/out/dir/a/b"),
        ("./a/../b", "/out/dir/b"),
        ("a/./b/c", "/out/dir/a/b/c"),
    ] {
        assert_eq!(namer.name(Path::new(input)).unwrap(), PathBuf::from(expected));
    }
}

#[test]
fn test_templated_namer() {
    let renderer = renderer(json!({"suffix": "txt", "in": "hidden"}));
    let cfg = Config { output_map: Some("  {{ in }}.out\n".to_string()), ..Default::default() };
    let namer = renderer.namer(&cfg);
    assert_eq!(namer.name(Path::new("a/b")).unwrap(), PathBuf::from("a/b.out"));

    let cfg = Config {
        output_map: Some("out/{{ in }}.{{ suffix }}.{{ ctx.suffix }}".to_string()),
        ..Default::default()
    };
    let namer = renderer.namer(&cfg);
    assert_eq!(namer.name(Path::new("./x")).unwrap(), PathBuf::from("out/x.txt.txt"));
}

#[test]
fn test_templated_namer_failure() {
    let renderer = renderer(json!({}));
    let cfg = Config { output_map: Some("{{ nope }}".to_string()), ..Default::default() };
    let namer = renderer.namer(&cfg);

    match namer.name(Path::new("a/b")) {
        Err(Error::NamingError { in_path, .. }) => assert_eq!(in_path, "a/b"),
        other => panic!("Expected NamingError, got {other:?}"),
    }
}

#[test]
fn test_run_templates_records_metrics() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in");
    let output = temp_dir.path().join("out");
    write_file(input.join("a"), "A={{ v }}");
    write_file(input.join("b"), "B={{ missing }}");
    let cfg = Config {
        input_dir: Some(input.clone()),
        output_dir: Some(output.clone()),
        ..Default::default()
    };
    let (mut streams, _) = buffer_streams("");
    let mut metrics = Metrics::new();
    let mut renderer = renderer(json!({"v": 1}));

    let result = renderer.run_templates(&cfg, &mut streams, &mut metrics);
    let err = result.unwrap_err();
    assert!(err.to_string().contains("failed to render template"));
    assert_eq!(metrics.templates_gathered, 2);
    assert_eq!(metrics.templates_processed, 1);
    assert_eq!(metrics.errors, 1);
    assert_eq!(metrics.render_duration.len(), 2);
    // earlier units stay written
    assert_eq!(fs::read_to_string(output.join("a")).unwrap(), "A=1");
    assert!(!output.join("b").exists());
}

#[test]
fn test_run_templates_gather_failure() {
    let temp_dir = TempDir::new().unwrap();
    let cfg = Config {
        input_dir: Some(temp_dir.path().join("missing")),
        output_dir: Some(temp_dir.path().join("out")),
        ..Default::default()
    };
    let (mut streams, _) = buffer_streams("");
    let mut metrics = Metrics::new();

    let result = renderer(json!({})).run_templates(&cfg, &mut streams, &mut metrics);
    assert!(matches!(result, Err(Error::GatherError(_))));
    assert_eq!(metrics.errors, 1);
    assert_eq!(metrics.templates_gathered, 0);
}
