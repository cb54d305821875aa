#![cfg(feature = "cli")]

use ecobuilder::{
    cli::{run, Command},
    config::Config,
    persistence::{ProjectSaver, SaveSession, Saver},
};

fn saved_project(root: &std::path::Path) -> std::path::PathBuf {
    let mut scenario = Config::default().build_scenario().expect("scenario");
    let exhibition = scenario.template_by_name("Exhibition").expect("exhibition").id();
    let artwork = scenario.template_by_name("Artwork").expect("artwork").id();
    scenario.select_template(exhibition).expect("select");
    scenario.select_template(artwork).expect("select");
    let e1 = scenario.create_entity(exhibition, "Spring Show").expect("e1");
    let w1 = scenario.create_entity(artwork, "W1").expect("w1");
    scenario
        .set_literal(e1, "hasLocation", "Tate Modern")
        .expect("literal");
    scenario.link(e1, "exhibits", w1).expect("link");

    let session = SaveSession::today(root, "input");
    ProjectSaver.save(&session, &scenario).expect("save")
}

#[test]
fn load_prints_report_and_summary() {
    colored::control::set_override(false);
    let tree = tree_fs::TreeBuilder::default()
        .add_directory("work")
        .create()
        .expect("create tree");
    let project = saved_project(&tree.root.join("work"));

    let mut out = Vec::new();
    run(&Command::Load { project }, &Config::default(), &mut out).expect("load");

    let text = String::from_utf8(out).expect("utf-8");
    insta::assert_snapshot!(text, @r"
    loaded: 3 models, 2 templates (0 custom), 0 custom relations, 2 entities, 1 literal values, 1 links
    models: 3
    selected templates: 2
    custom templates: 0
    custom relations: 0
    entities: 2
      - DVA: 2
    literal values: 1
    links: 1
    ");
}

#[test]
fn export_writes_the_three_formats() {
    colored::control::set_override(false);
    let tree = tree_fs::TreeBuilder::default()
        .add_directory("work")
        .add_directory("out")
        .create()
        .expect("create tree");
    let project = saved_project(&tree.root.join("work"));

    let mut out = Vec::new();
    run(
        &Command::Export {
            project,
            output: tree.root.join("out"),
        },
        &Config::default(),
        &mut out,
    )
    .expect("export");

    for folder in ["turtle", "rdf-xml", "projects"] {
        let files = std::fs::read_dir(tree.root.join("out").join(folder))
            .expect("format folder")
            .count();
        assert_eq!(files, 1, "{folder}");
    }
    let text = String::from_utf8(out).expect("utf-8");
    assert_eq!(text.matches("wrote:").count(), 3);
}
