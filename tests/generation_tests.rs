//! Integration tests for generating code from story models

use pretty_assertions::assert_eq;

use story_codegen::context::ContextFactory;
use story_codegen::fragment::{resolve_all, SeriesFilter};
use story_codegen::{
    generate, Dictionary, Fragment, GenerateError, Generator, LanguageDefinition, Session,
    StoryGraph,
};

fn gate_generator() -> Generator {
    let dictionary = Dictionary::parse(include_str!("fixtures/gate.formats")).expect("Should load");
    let language =
        LanguageDefinition::from_str(include_str!("fixtures/c_like.toml")).expect("Should load");
    Generator::new(dictionary, language)
}

fn gate_model() -> StoryGraph {
    StoryGraph::from_str(include_str!("fixtures/gate.toml")).expect("Should load")
}

#[test]
fn test_gate_script_fixture() {
    let model = gate_model();
    let code = gate_generator()
        .generate(&model, model.root(), "script")
        .expect("Should generate");
    assert_eq!(code, include_str!("fixtures/gate.expected"));
}

#[test]
fn test_generate_from_inner_root() {
    let model = gate_model();
    let root = model.entity_id("open_gate").expect("entity");
    let code = gate_generator()
        .generate(&model, root, "call")
        .expect("Should generate");
    // no kind mapping for a script_it, and no target attribute
    assert_eq!(code, "noop(self);");
}

#[test]
fn test_condition_then_block() {
    const MODEL: &str = r#"
        [[entity]]
        id = "task"
        scopes.condition = "cond"
        series.children = ["a", "b"]

        [[entity]]
        id = "cond"
        attributes.text = "x>0"

        [[entity]]
        id = "a"
        attributes.text = "a"

        [[entity]]
        id = "b"
        attributes.text = "b"
    "#;
    let model = StoryGraph::from_str(MODEL).unwrap();

    let fragments = vec![
        Fragment::line(vec![
            Fragment::literal("if ("),
            Fragment::scope("condition", vec![Fragment::data("text")]),
            Fragment::literal(") {"),
        ]),
        // indent only pushes the prefix; the line around the series applies it
        Fragment::indent(vec![Fragment::line(vec![Fragment::series(
            "children",
            ", ",
            vec![Fragment::data("text")],
        )])]),
        Fragment::line(vec![Fragment::literal("}")]),
    ];

    let generator = Generator::new(Dictionary::default(), LanguageDefinition::default());
    let code = generator
        .generate_fragments(&model, model.root(), &fragments)
        .expect("Should generate");
    assert_eq!(code, "if (x>0) {\n\ta, b\n}\n");
}

#[test]
fn test_scope_does_not_leak_into_siblings() {
    const MODEL: &str = r#"
        [[entity]]
        id = "task"
        name = "task"
        scopes.subject = "player"

        [[entity]]
        id = "player"
        name = "player"
    "#;
    let model = StoryGraph::from_str(MODEL).unwrap();
    let fragments = vec![
        Fragment::data("display_name"),
        Fragment::literal("/"),
        Fragment::scope("subject", vec![Fragment::data("display_name")]),
        Fragment::literal("/"),
        Fragment::data("display_name"),
    ];

    let generator = Generator::new(Dictionary::default(), LanguageDefinition::default());
    let code = generator.generate_fragments(&model, model.root(), &fragments).unwrap();
    assert_eq!(code, "task/player/task");
}

#[test]
fn test_reference_equals_inline_resolution() {
    let dictionary = Dictionary::parse(include_str!("fixtures/gate.formats")).unwrap();
    let model = gate_model();
    let root = model.entity_id("open_gate").unwrap();
    let language = LanguageDefinition::default();

    let task = dictionary.formats().get("task").expect("format");
    let direct = {
        let mut session = Session::new(dictionary.formats(), dictionary.maps(), &language);
        let ctx = ContextFactory::root(&model, root.into());
        resolve_all(&task.fragments, &ctx, &mut session).unwrap()
    };

    let generator = Generator::new(dictionary.clone(), language.clone());
    let through_ref = generator
        .generate_fragments(&model, root, &[Fragment::reference("task")])
        .unwrap();
    assert_eq!(through_ref, direct);
}

#[test]
fn test_unresolved_data_keeps_line_terminator() {
    let model = gate_model();
    let generator = Generator::new(Dictionary::default(), LanguageDefinition::default());
    let code = generator
        .generate_fragments(
            &model,
            model.root(),
            &[Fragment::line(vec![
                Fragment::literal("x = "),
                Fragment::data("no_such_attribute"),
            ])],
        )
        .expect("Should generate");

    assert!(code.starts_with("x = <?"));
    assert!(code.contains("no_such_attribute"));
    assert!(code.ends_with('\n'));
}

#[test]
fn test_unique_runs_before_filter() {
    const MODEL: &str = r#"
        [[entity]]
        id = "task"
        series.children = ["a", "b", "a", "c"]

        [[entity]]
        id = "a"
        name = "alpha"

        [[entity]]
        id = "b"
        name = "beta"

        [[entity]]
        id = "c"
        name = "gamma"
    "#;
    let model = StoryGraph::from_str(MODEL).unwrap();
    let mut series = story_codegen::fragment::SeriesFragment::new(
        "children",
        ",",
        vec![Fragment::data("display_name")],
    )
    .unique()
    .with_filter(SeriesFilter::name("alpha|gamma"));

    let generator = Generator::new(Dictionary::default(), LanguageDefinition::default());
    let code = generator
        .generate_fragments(&model, model.root(), &[series.clone().into()])
        .unwrap();
    assert_eq!(code, "alpha,gamma");

    series.unique = false;
    let code = generator
        .generate_fragments(&model, model.root(), &[series.into()])
        .unwrap();
    assert_eq!(code, "alpha,alpha,gamma");
}

#[test]
fn test_series_binding_and_position() {
    const DICTIONARY: &str = r#"
        format main {
            series children as item {
                scope bound "item" { data display_name }
                if !is_last { ", " }
            }
        }
    "#;
    const MODEL: &str = r#"
        [[entity]]
        id = "task"
        series.children = ["a", "b", "c"]

        [[entity]]
        id = "a"
        name = "a"

        [[entity]]
        id = "b"
        name = "b"

        [[entity]]
        id = "c"
        name = "c"
    "#;
    let model = StoryGraph::from_str(MODEL).unwrap();
    let code = generate(DICTIONARY, &model, model.root(), "main", LanguageDefinition::default())
        .expect("Should generate");
    assert_eq!(code, "a, b, c");
}

#[test]
fn test_slot_filter_drops_entities_without_slots() {
    const DICTIONARY: &str = r#"
        format main {
            series parameters separator " " filter slot "on.*" { data display_name }
        }
    "#;
    const MODEL: &str = r#"
        [[entity]]
        id = "task"
        series.parameters = ["door", "lamp", "rock"]
        text_series.parameters = ["onText"]

        [[entity]]
        id = "door"
        name = "door"
        slots = ["onUse"]

        [[entity]]
        id = "lamp"
        name = "lamp"
        slots = ["offUse", "onLight"]

        [[entity]]
        id = "rock"
        name = "rock"
    "#;
    let model = StoryGraph::from_str(MODEL).unwrap();
    let code = generate(DICTIONARY, &model, model.root(), "main", LanguageDefinition::default())
        .unwrap();
    assert_eq!(code, "door lamp");
}

#[test]
fn test_names_avoid_reserved_words() {
    const MODEL: &str = r#"
        [[entity]]
        id = "task"
        series.variables = ["a", "b"]

        [[entity]]
        id = "a"
        name = "return"

        [[entity]]
        id = "b"
        name = "3 lamps"
    "#;
    let model = StoryGraph::from_str(MODEL).unwrap();
    let language =
        LanguageDefinition::from_str(include_str!("fixtures/c_like.toml")).unwrap();
    let code = generate(
        r#"format main { series variables { line { "int " data name ";" } } }"#,
        &model,
        model.root(),
        "main",
        language,
    )
    .unwrap();
    assert_eq!(code, "int return_0;\nint lamps;\n");
}

#[test]
fn test_missing_entry_point() {
    let model = gate_model();
    let err = gate_generator()
        .generate(&model, model.root(), "nothing")
        .unwrap_err();
    assert!(matches!(err, GenerateError::UnknownFormat(_)));
    assert_eq!(err.to_string(), "unknown entry point: format not found: nothing");
}

#[test]
fn test_concurrent_runs_share_one_generator() {
    let model = gate_model();
    let generator = gate_generator();
    let expected = include_str!("fixtures/gate.expected");

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                let code = generator.generate(&model, model.root(), "script").unwrap();
                assert_eq!(code, expected);
            });
        }
    });
}
