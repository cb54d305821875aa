use std::fs;

use chrono::NaiveDate;
use ecobuilder::{
    config::Config,
    ontology::Scenario,
    persistence::{
        Cancelled, Dispatcher, FixedDirectory, PersistenceError, ProjectSaver, SaveSession,
        Saver, TurtleSaver,
    },
    project::ProjectLoader,
};

fn scenario() -> Scenario {
    let mut scenario = Config::default().build_scenario().expect("scenario");
    let artist = scenario.template_by_name("Artist").expect("artist").id();
    scenario.select_template(artist).expect("select");
    let a1 = scenario.create_entity(artist, "A1").expect("a1");
    scenario
        .set_literal(a1, "hasDescription", "oil on canvas")
        .expect("literal");
    scenario
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 9).expect("date")
}

#[test]
fn writes_every_format_into_its_folder() {
    let tree = tree_fs::TreeBuilder::default()
        .add_directory("out")
        .create()
        .expect("create tree");
    let session = SaveSession::new(tree.root.join("out"), "exhibition", date());

    let paths = Dispatcher::with_defaults()
        .save_all(&session, &scenario())
        .expect("save");

    let expected = [
        "out/turtle/exhibition_2024-03-09.ttl",
        "out/rdf-xml/exhibition_2024-03-09.rdf",
        "out/projects/exhibition_2024-03-09.json",
    ];
    assert_eq!(
        paths,
        expected
            .iter()
            .map(|path| tree.root.join(path))
            .collect::<Vec<_>>()
    );
    for path in &paths {
        assert!(fs::metadata(path).expect("written").len() > 0);
    }
    let turtle = fs::read_to_string(&paths[0]).expect("turtle");
    assert!(turtle.contains("oil on canvas"));
}

#[test]
fn saved_project_loads_back() {
    let tree = tree_fs::TreeBuilder::default()
        .add_directory("out")
        .create()
        .expect("create tree");
    let session = SaveSession::new(tree.root.join("out"), "scenario", date());
    let path = ProjectSaver.save(&session, &scenario()).expect("save");

    let mut loaded = Config::default().build_scenario().expect("scenario");
    let report = ProjectLoader::new(&mut loaded)
        .load_file(&path)
        .expect("load");

    assert_eq!(report.entities, 1);
    assert_eq!(report.literals, 1);
    assert_eq!(loaded.summary(), scenario().summary());
}

#[test]
fn cancelled_save_writes_nothing() {
    let tree = tree_fs::TreeBuilder::default()
        .add_directory("out")
        .create()
        .expect("create tree");

    let written = Dispatcher::with_defaults()
        .save_with(&mut Cancelled, "scenario", &scenario())
        .expect("cancel is not an error");

    assert!(written.is_none());
    assert_eq!(
        fs::read_dir(tree.root.join("out")).expect("dir").count(),
        0
    );
}

#[test]
fn chosen_directory_receives_todays_files() {
    let tree = tree_fs::TreeBuilder::default()
        .add_directory("out")
        .create()
        .expect("create tree");

    let written = Dispatcher::new()
        .add(TurtleSaver)
        .save_with(&mut FixedDirectory(tree.root.join("out")), "scenario", &scenario())
        .expect("save")
        .expect("not cancelled");

    assert_eq!(written.len(), 1);
    let name = written[0]
        .file_name()
        .and_then(|name| name.to_str())
        .expect("file name");
    assert!(name.starts_with("scenario_"));
    assert!(name.ends_with(".ttl"));
}

#[test]
fn unwritable_destination_is_an_io_error() {
    let tree = tree_fs::TreeBuilder::default()
        .add_file("out", "a file where a folder is expected")
        .create()
        .expect("create tree");
    let session = SaveSession::new(tree.root.join("out"), "scenario", date());

    let err = TurtleSaver
        .save(&session, &scenario())
        .expect_err("parent is a file");

    assert!(matches!(err, PersistenceError::Io { .. }));
    assert!(!session.file_path("turtle", "ttl").exists());
}
