//! Rendering tests for the template engine.

use super::*;

fn ctx(yaml: &str) -> Value {
    serde_yaml::from_str(yaml).unwrap()
}

fn empty() -> Value {
    Value::Mapping(serde_yaml::Mapping::new())
}

#[test]
fn test_simple_substitution() {
    let context = ctx("service: {name: svc}");
    let result = render_str("{{ service.name }}-{{ service.name }}", &context).unwrap();
    assert_eq!(result, "svc-svc");
}

#[test]
fn test_render_is_stable_on_plain_output() {
    let context = ctx("service: {name: svc}");
    let once = render_str("{{ service.name }}-{{ service.name }}", &context).unwrap();
    let twice = render_str(&once, &context).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_no_placeholders() {
    let result = render_str("Just plain text", &empty()).unwrap();
    assert_eq!(result, "Just plain text");
}

#[test]
fn test_trailing_newline_kept() {
    let context = ctx("stage: dev");
    assert_eq!(render_str("STAGE={{ stage }}\n", &context).unwrap(), "STAGE=dev\n");
}

#[test]
fn test_scalar_display() {
    let context = ctx("port: 8080\nflag: true\nnothing: null\nratio: 1.5");
    let result = render_str("{{ port }} {{ flag }} [{{ nothing }}] {{ ratio }}", &context).unwrap();
    assert_eq!(result, "8080 true [] 1.5");
}

#[test]
fn test_sequence_subscript() {
    let context = ctx("service: {ports: [{port: 80}, {port: 443}]}");
    let result = render_str("{{ service.ports[1].port }}", &context).unwrap();
    assert_eq!(result, "443");
}

#[test]
fn test_missing_top_level_is_empty() {
    let context = ctx("service: {name: svc}");
    assert_eq!(render_str("[{{ missing }}]", &context).unwrap(), "[]");
}

#[test]
fn test_missing_leaf_on_existing_mapping_is_empty() {
    let context = ctx("service: {name: svc}");
    assert_eq!(render_str("[{{ service.image }}]", &context).unwrap(), "[]");
}

#[test]
fn test_access_through_absent_parent_is_error() {
    let context = ctx("service: {name: svc}");
    let err = render_str("{{ routing.port }}", &context).unwrap_err();
    assert!(matches!(err, TemplateError::UndefinedParent { .. }), "{:?}", err);

    let err = render_str("a\n{{ service.healthcheck.test }}", &context).unwrap_err();
    match err {
        TemplateError::UndefinedParent { line, .. } => assert_eq!(line, Some(2)),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_default_filter() {
    let context = ctx("service: {name: svc, image: null}\nstage: dev");
    let result = render_str(
        "{{ service.image | default('busybox', true) }} {{ service.name | default('x') }} {{ tag | default(stage) }}",
        &context,
    )
    .unwrap();
    assert_eq!(result, "busybox svc dev");
}

#[test]
fn test_string_filters() {
    let context = ctx("name: '  Web App  '");
    assert_eq!(render_str("{{ name | trim | upper }}", &context).unwrap(), "WEB APP");
    assert_eq!(render_str("{{ name | trim | lower }}", &context).unwrap(), "web app");
}

#[test]
fn test_join_and_length() {
    let context = ctx("networks: [secured, exposed]");
    assert_eq!(
        render_str("{{ networks | join(', ') }} ({{ networks | length }})", &context).unwrap(),
        "secured, exposed (2)"
    );
}

#[test]
fn test_tojson_filter() {
    let context = ctx("env: {A: '1'}");
    assert_eq!(render_str("{{ env | tojson }}", &context).unwrap(), r#"{"A":"1"}"#);
}

#[test]
fn test_if_else() {
    let template = "{% if host_network %}network_mode: host{% else %}ports: []{% endif %}";
    assert_eq!(
        render_str(template, &ctx("host_network: true")).unwrap(),
        "network_mode: host"
    );
    assert_eq!(render_str(template, &ctx("other: 1")).unwrap(), "ports: []");
}

#[test]
fn test_elif_and_comparison() {
    let template = "{% if stage == 'prod' %}P{% elif stage != 'dev' %}T{% else %}D{% endif %}";
    assert_eq!(render_str(template, &ctx("stage: prod")).unwrap(), "P");
    assert_eq!(render_str(template, &ctx("stage: test")).unwrap(), "T");
    assert_eq!(render_str(template, &ctx("stage: dev")).unwrap(), "D");
}

#[test]
fn test_membership_and_tests() {
    let context = ctx("xs: [a, b]");
    assert_eq!(
        render_str("{% if 'a' in xs %}yes{% endif %}", &context).unwrap(),
        "yes"
    );
    assert_eq!(
        render_str("{% if xs is defined %}d{% endif %}{% if ys is defined %}y{% endif %}", &context)
            .unwrap(),
        "d"
    );
}

#[test]
fn test_whitespace_control_markers() {
    let context = ctx("xs: [a, b]");
    assert_eq!(
        render_str("[ {%- for x in xs -%} {{ x }} {%- endfor -%} ]", &context).unwrap(),
        "[ab]"
    );
}

#[test]
fn test_for_over_sequence_with_line_trimming() {
    let context = ctx("service: {ports: [{port: 80}, {port: 443}]}");
    let template = "ports:\n  {% for p in service.ports %}\n  - \"{{ p.port }}:{{ p.port }}\"\n  {% endfor %}\ndone\n";
    assert_eq!(
        render_str(template, &context).unwrap(),
        "ports:\n  - \"80:80\"\n  - \"443:443\"\ndone\n"
    );
}

#[test]
fn test_for_over_mapping_items() {
    let context = ctx("env: {A: '1', B: '2'}");
    let template =
        "{% for key, value in env | items %}{{ key }}={{ value }}{% if not loop.last %};{% endif %}{% endfor %}";
    assert_eq!(render_str(template, &context).unwrap(), "A=1;B=2");
}

#[test]
fn test_for_over_undefined_is_empty() {
    assert_eq!(
        render_str("[{% for x in nothing %}{{ x }}{% endfor %}]", &ctx("a: 1")).unwrap(),
        "[]"
    );
}

#[test]
fn test_for_over_number_is_evaluation_error() {
    let err = render_str("{% for x in port %}{% endfor %}", &ctx("port: 80")).unwrap_err();
    assert!(matches!(err, TemplateError::Evaluation { .. }), "{:?}", err);
}

#[test]
fn test_unclosed_tag_is_syntax_error() {
    let err = render_str("line one\n{{ service.name ", &ctx("a: 1")).unwrap_err();
    assert!(matches!(err, TemplateError::Syntax { .. }), "{:?}", err);
    assert!(err.to_string().starts_with("syntax error"));
}

#[test]
fn test_comments_removed() {
    assert_eq!(
        render_str("a{# hidden #}b\nc", &empty()).unwrap(),
        "ab\nc"
    );
}

#[test]
fn test_literal_braces_pass_through() {
    let context = ctx("x: 1");
    assert_eq!(
        render_str(r#"{"x": {{ x }}}"#, &context).unwrap(),
        r#"{"x": 1}"#
    );
}

#[test]
fn test_no_html_escaping() {
    let context = ctx("cmd: \"curl -f 'http://localhost:80' && echo <ok>\"");
    assert_eq!(
        render_str("{{ cmd }}", &context).unwrap(),
        "curl -f 'http://localhost:80' && echo <ok>"
    );
}

#[test]
fn test_unicode_in_template_and_values() {
    let context = ctx("emoji: \"🎉\"\ntext: 日本語");
    assert_eq!(
        render_str("Hello {{ emoji }} {{ text }}!", &context).unwrap(),
        "Hello 🎉 日本語!"
    );
}

#[test]
fn test_evaluate_whole_keeps_type() {
    let engine = TemplateEngine::new();
    let context = ctx("routing: {port: 8080}\nlabels: {a: b}");

    let value = engine.evaluate_whole("{{ routing.port }}", &context).unwrap().unwrap();
    assert_eq!(value, Value::Number(8080.into()));

    let value = engine.evaluate_whole("{{ labels }}", &context).unwrap().unwrap();
    assert_eq!(value, ctx("{a: b}"));

    let value = engine.evaluate_whole("{{ missing }}", &context).unwrap().unwrap();
    assert_eq!(value, Value::String(String::new()));
}

#[test]
fn test_evaluate_whole_ignores_mixed_templates() {
    let engine = TemplateEngine::new();
    assert!(engine.evaluate_whole("port {{ routing.port }}", &empty()).is_none());
    assert!(engine.evaluate_whole("{{ a }}{{ b }}", &empty()).is_none());
    assert!(engine.evaluate_whole("{{ a }}\n", &empty()).is_none());
}

#[test]
fn test_references() {
    let engine = TemplateEngine::new();
    let refs = engine
        .references("{{ service.name }}.{{ domain }}{% for p in ports %}{{ p.port }}{% endfor %}")
        .unwrap();
    assert!(refs.contains("service.name"));
    assert!(refs.contains("domain"));
    assert!(refs.contains("ports"));
    assert!(!refs.iter().any(|r| r.starts_with("p.") || r == "p"));
}

#[test]
fn test_contains_syntax() {
    assert!(contains_syntax("{{ a }}"));
    assert!(contains_syntax("{% if a %}{% endif %}"));
    assert!(contains_syntax("{# c #}"));
    assert!(!contains_syntax("{ a }"));
    assert!(!contains_syntax("plain"));
}

#[test]
fn test_error_display() {
    let err = TemplateError::Syntax {
        message: "unexpected end of input".to_string(),
        line: Some(4),
    };
    assert_eq!(err.to_string(), "syntax error on line 4: unexpected end of input");

    let err = TemplateError::Evaluation {
        message: "unknown filter".to_string(),
        line: None,
    };
    assert_eq!(err.to_string(), "evaluation error: unknown filter");
}
