use rve_mesh::{
    batch::BatchRunner,
    classify::Classifier,
    config::PipelineConfig,
    deck::{write_model, DeckWriter},
    layout::InclusionLayout,
    mesh::{region::Region, Mesh},
    unv::read_unv,
    BoundaryNodeSets,
};

use std::collections::BTreeMap;
use std::fs::{copy, create_dir_all, read, read_to_string, write};
use std::path::Path;
use tempfile::tempdir;

const MESH: &str = "./test_input/RVE_model/rve_2d.unv";
const LAYOUT: &str = "./test_input/RVE_definition/rve_2d.json";

fn stage(root: &Path, name: &str) {
    create_dir_all(root.join("RVE_model")).unwrap();
    create_dir_all(root.join("RVE_definition")).unwrap();
    copy(MESH, root.join("RVE_model").join(format!("{}.unv", name))).unwrap();
    copy(LAYOUT, root.join("RVE_definition").join(format!("{}.json", name))).unwrap();
}

/// Read the part's `*Node` and `*Element` blocks back out of a deck
fn parse_deck(deck: &str) -> (BTreeMap<usize, [f64; 2]>, BTreeMap<usize, Vec<usize>>) {
    let mut nodes = BTreeMap::new();
    let mut elements = BTreeMap::new();
    let mut keyword = "";

    for line in deck.lines() {
        if line == "*End Part" {
            break;
        }
        if line.starts_with('*') {
            keyword = line;
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if keyword == "*Node" {
            let id = fields[0].parse().unwrap();
            nodes.insert(id, [fields[1].parse().unwrap(), fields[2].parse().unwrap()]);
        } else if keyword.starts_with("*Element") {
            let ids: Vec<usize> = fields.iter().map(|f| f.parse().unwrap()).collect();
            elements.insert(ids[0], ids[1..].to_vec());
        }
    }

    (nodes, elements)
}

fn render(mesh: &Mesh, cfg: &PipelineConfig) -> String {
    let boundary = BoundaryNodeSets::extract(mesh, cfg.boundary_tolerance);
    let mut out = Vec::new();
    DeckWriter::new(mesh, None, &boundary, cfg)
        .unwrap()
        .render(&mut out)
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn deck_round_trip() {
    let mesh = read_unv(MESH).unwrap();
    let (nodes, elements) = parse_deck(&render(&mesh, &PipelineConfig::default()));

    assert_eq!(nodes.len(), mesh.num_nodes());
    for (id, p) in mesh.nodes() {
        let [x, y] = nodes[&id];
        assert!((x - p.x()).abs() < 1e-6, "node {} x", id);
        assert!((y - p.y()).abs() < 1e-6, "node {} y", id);
    }

    assert_eq!(elements.len(), mesh.num_elements());
    for element in mesh.elements() {
        assert_eq!(elements[&element.id], element.nodes.to_vec());
    }
}

#[test]
fn deck_is_byte_identical_across_runs() {
    let dir = tempdir().unwrap();
    let mesh = read_unv(MESH).unwrap();
    let layout = InclusionLayout::from_file(LAYOUT).unwrap();
    let cfg = PipelineConfig::default();
    let classification = Classifier::new(&layout, &cfg).classify(&mesh);

    let a = write_model(&mesh, Some(&classification), &cfg, dir.path().join("a.inp")).unwrap();
    let b = write_model(&mesh, Some(&classification), &cfg, dir.path().join("b.inp")).unwrap();

    assert_eq!(read(a.deck).unwrap(), read(b.deck).unwrap());
    assert_eq!(read(a.dimensions).unwrap(), read(b.dimensions).unwrap());
}

#[test]
fn batch_with_one_malformed_file() {
    let dir = tempdir().unwrap();
    for name in ["rve_1", "rve_2", "rve_3"] {
        stage(dir.path(), name);
    }

    // a non-numeric field in the 4th node's coordinates (line 16)
    let broken = dir.path().join("RVE_model/rve_2.unv");
    let mut lines: Vec<String> = read_to_string(&broken)
        .unwrap()
        .lines()
        .map(String::from)
        .collect();
    lines[15] = String::from("   0.0000000000000000D+00   abc   0.0000000000000000D+00");
    write(&broken, lines.join("\n") + "\n").unwrap();

    let cfg = PipelineConfig {
        workers: Some(2),
        ..PipelineConfig::default()
    };
    let report = BatchRunner::new(cfg).run(dir.path()).unwrap();

    assert_eq!(report.annotated.len(), 2);
    assert_eq!(report.failures.len(), 1);

    let log = read_to_string(dir.path().join("processing_errors.log")).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.contains("rve_2.unv"));
    assert!(log.contains("line 16"));

    // the broken file is left untouched, the others carry their groups
    assert!(read_unv(&broken).is_err());
    let annotated = read_unv(dir.path().join("RVE_model/rve_3.unv")).unwrap();
    assert_eq!(annotated.group(Region::Envelope), vec![1, 2]);
    assert_eq!(annotated.group(Region::Inclusion(1)), vec![4, 5]);
}

#[test]
fn annotated_groups_feed_the_deck() {
    let dir = tempdir().unwrap();
    stage(dir.path(), "rve");
    let cfg = PipelineConfig {
        workers: Some(1),
        ..PipelineConfig::default()
    };

    BatchRunner::new(cfg.clone()).run(dir.path()).unwrap();
    // a second pass appends a second group section; the latest definition wins
    BatchRunner::new(cfg.clone()).run(dir.path()).unwrap();
    assert!(!dir.path().join("processing_errors.log").exists());

    let mesh = read_unv(dir.path().join("RVE_model/rve.unv")).unwrap();
    let layout = InclusionLayout::from_file(LAYOUT).unwrap();
    let classification = Classifier::new(&layout, &cfg).classify(&mesh);

    assert_eq!(mesh.groups(), classification.groups());

    let boundary = BoundaryNodeSets::extract(&mesh, cfg.boundary_tolerance);
    let mut from_groups = Vec::new();
    DeckWriter::new(&mesh, None, &boundary, &cfg)
        .unwrap()
        .render(&mut from_groups)
        .unwrap();
    let mut from_classification = Vec::new();
    DeckWriter::new(&mesh, Some(&classification), &boundary, &cfg)
        .unwrap()
        .render(&mut from_classification)
        .unwrap();

    assert_eq!(from_groups, from_classification);
}
