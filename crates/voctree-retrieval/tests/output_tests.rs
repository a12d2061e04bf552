use std::collections::BTreeMap;

use tempfile::TempDir;

use voctree_core::config::ReportFormat;
use voctree_core::types::{Match, QueryBatch};
use voctree_core::Error;
use voctree_io::SceneDescription;
use voctree_retrieval::report::{format_score, render, render_document_map, render_matlab, render_plain};
use voctree_retrieval::sanity::evaluate;
use voctree_retrieval::symlinks::{materialize, rank_link_name};
use voctree_retrieval::QueryScene;

fn m(id: usize, score: f32) -> Match {
    Match { id, score }
}

/// Document 1 prefers document 2 over itself.
fn batch_with_one_mismatch() -> QueryBatch {
    vec![
        vec![m(0, 2.0), m(2, 0.5)],
        vec![m(2, 1.5), m(1, 1.25)],
        vec![m(2, 2.0), m(1, 0.125)],
    ]
}

#[test]
fn scores_print_like_a_default_stream() {
    assert_eq!(format_score(2.0), "2");
    assert_eq!(format_score(0.0), "0");
    assert_eq!(format_score(0.5), "0.5");
    assert_eq!(format_score(1.25), "1.25");
    assert_eq!(format_score(0.1), "0.1");
    assert_eq!(format_score(1.0 / 3.0), "0.333333");
    assert_eq!(format_score(0.00001), "1e-05");
    assert_eq!(format_score(1234567.0), "1.23457e+06");
}

#[test]
fn plain_report_lists_one_triple_per_match() {
    let text = render_plain(&batch_with_one_mismatch());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["0 0 2", "0 2 0.5", "1 2 1.5", "1 1 1.25", "2 2 2", "2 1 0.125"]);
}

#[test]
fn matlab_report_uses_one_based_cells() {
    let text = render_matlab(&batch_with_one_mismatch());
    assert_eq!(
        text,
        "m{1}=[ 0, 2; 2, 0.5; ];\nm{2}=[ 2, 1.5; 1, 1.25; ];\nm{3}=[ 2, 2; 1, 0.125; ];\n"
    );
}

#[test]
fn both_formats_carry_the_same_triples() {
    let batch = batch_with_one_mismatch();
    let plain: Vec<(usize, String, String)> = render(ReportFormat::Plain, &batch)
        .lines()
        .map(|l| {
            let mut parts = l.split(' ');
            let q = parts.next().unwrap().parse().unwrap();
            (q, parts.next().unwrap().to_string(), parts.next().unwrap().to_string())
        })
        .collect();

    let mut matlab = Vec::new();
    for (i, line) in render(ReportFormat::Matlab, &batch).lines().enumerate() {
        let body = line.split_once("=[ ").unwrap().1.trim_end_matches("];");
        for entry in body.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (id, score) = entry.split_once(", ").unwrap();
            matlab.push((i, id.to_string(), score.to_string()));
        }
    }
    assert_eq!(plain, matlab);
}

#[test]
fn empty_batch_renders_nothing() {
    assert_eq!(render_plain(&Vec::new()), "");
    assert_eq!(render_matlab(&Vec::new()), "");
}

#[test]
fn document_map_lists_words_in_order() {
    let mut docs = BTreeMap::new();
    docs.insert(0, vec![3, 1, 3]);
    docs.insert(1, vec![]);
    assert_eq!(render_document_map(&docs), "d{0} = [ 3, 1, 3, ];\nd{1} = [ ];\n");
}

#[test]
fn sanity_counts_documents_not_retrieving_themselves() {
    let report = evaluate(&batch_with_one_mismatch());
    assert_eq!(report.mismatches, vec![1]);
    assert_eq!(report.wrong(), 1);
    assert!(!report.is_clean());
}

#[test]
fn sanity_counts_empty_lists_as_wrong() {
    let report = evaluate(&vec![vec![m(0, 2.0)], vec![]]);
    assert_eq!(report.mismatches, vec![1]);
}

#[test]
fn rank_prefix_keeps_listing_in_rank_order() {
    let names: Vec<String> = (0..12).map(|r| rank_link_name(r, "a.jpg")).collect();
    assert_eq!(names[0], "0000.a.jpg");
    assert_eq!(names[11], "0011.a.jpg");
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(sorted, names);
}

#[test]
fn query_scene_resolves_to_the_corpus_in_self_query_mode() {
    let corpus = SceneDescription::new("/corpus").with_view(0, "a.jpg");
    let owned = QueryScene::Owned(SceneDescription::new("/queries").with_view(0, "q.jpg"));
    assert_eq!(QueryScene::Corpus.resolve(&corpus).root_path, corpus.root_path);
    assert_eq!(owned.resolve(&corpus).root_path.to_str(), Some("/queries"));
}

#[test]
fn unknown_match_id_is_a_consistency_error() {
    let tmp = TempDir::new().unwrap();
    let corpus = SceneDescription::new("/corpus").with_view(0, "a.jpg").with_view(1, "b.jpg");
    let batch = vec![vec![m(0, 2.0), m(7, 0.5)]];

    let err = materialize(tmp.path(), &corpus, &corpus, &batch).unwrap_err();
    assert!(matches!(err, Error::Consistency { id: 7 }), "got {err}");
}

#[test]
fn unknown_query_id_is_a_consistency_error() {
    let tmp = TempDir::new().unwrap();
    let corpus = SceneDescription::new("/corpus").with_view(0, "a.jpg");
    let queries = SceneDescription::new("/queries").with_view(1, "q.jpg");
    let batch = vec![vec![m(0, 1.0)]];

    assert!(matches!(
        materialize(tmp.path(), &corpus, &queries, &batch),
        Err(Error::Consistency { id: 0 })
    ));
}

#[cfg(unix)]
#[test]
fn materialize_replaces_links_on_a_second_run() {
    let tmp = TempDir::new().unwrap();
    let corpus = SceneDescription::new("/corpus").with_view(0, "a.jpg").with_view(1, "sub/b.jpg");
    let batch = vec![vec![m(0, 2.0), m(1, 0.5)], vec![m(1, 2.0), m(0, 0.5)]];

    materialize(tmp.path(), &corpus, &corpus, &batch).expect("first run");
    let buckets = materialize(tmp.path(), &corpus, &corpus, &batch).expect("second run");

    assert_eq!(buckets, vec![tmp.path().join("a.jpg"), tmp.path().join("b.jpg")]);
    let link = std::fs::read_link(tmp.path().join("a.jpg").join("0001.b.jpg")).unwrap();
    assert_eq!(link, std::path::PathBuf::from("/corpus/sub/b.jpg"));
}

#[cfg(unix)]
#[test]
fn colliding_query_names_get_separate_buckets() {
    let tmp = TempDir::new().unwrap();
    let corpus = SceneDescription::new("/corpus").with_view(0, "left/x.jpg").with_view(1, "right/x.jpg");
    let batch = vec![vec![m(0, 2.0)], vec![m(1, 2.0)]];

    let buckets = materialize(tmp.path(), &corpus, &corpus, &batch).expect("materialize");
    assert_eq!(buckets, vec![tmp.path().join("x.jpg"), tmp.path().join("1.x.jpg")]);
    let link = std::fs::read_link(tmp.path().join("1.x.jpg").join("0000.x.jpg")).unwrap();
    assert_eq!(link, std::path::PathBuf::from("/corpus/right/x.jpg"));
}
