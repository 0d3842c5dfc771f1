use workflow_placement::api::request_dto::RawDocument;
use workflow_placement::domain::utils::id::SiteName;
use workflow_placement::error::Error;
use workflow_placement::loader::parser::parse_json_file;
use workflow_placement::{build_planner, load_config};

fn data_file(name: &str) -> String {
    format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[tokio::test]
async fn plans_batch_from_snapshot_files() {
    let config = load_config(Some(&data_file("config.json"))).unwrap();
    let requests: Vec<RawDocument> = parse_json_file(&data_file("requests.json")).unwrap();
    let planner = build_planner(&config, &data_file("sites.json"), Some(&data_file("snapshot.json"))).unwrap();

    let report = planner.plan(requests).await;

    let names: Vec<&str> = report.plans.iter().map(|p| p.workflow_name.as_str()).collect();
    assert_eq!(names, vec!["reco_2024", "wrapped_lhe"]);

    let reco = report.plan("reco_2024").unwrap();
    let allowed: Vec<&str> = reco.allowed_sites.iter().map(SiteName::as_str).collect();
    assert_eq!(allowed, vec!["T1_US_FNAL", "T2_CH_CERN"]);
    assert_eq!(reco.size_bytes, 5_000_000_000_000);
    assert_eq!(reco.num_events, 20_000_000);
    assert_eq!(reco.num_lumis, 40_000);
    assert!((reco.estimated_cpu_hours - 100_000.0).abs() < 1e-6);
    assert_eq!(reco.required_copies, 2);
    assert_eq!(reco.current_nodes.len(), 2);

    let lhe = report.plan("wrapped_lhe").unwrap();
    assert!(lhe.is_lhe_input);
    assert_eq!(lhe.allowed_sites.iter().map(SiteName::as_str).collect::<Vec<_>>(), vec!["T2_CH_CERN_EOS"]);
    assert!((lhe.estimated_cpu_hours - 2.0).abs() < 1e-9);
    assert_eq!(lhe.required_copies, 1);

    let broken: Vec<_> = report.warnings_for("broken_input").collect();
    assert_eq!(broken.len(), 1);
    assert!(matches!(&broken[0].reason, Error::UnresolvableDataset(d) if d == "/Missing/Dataset/AOD"));

    assert_eq!(report.totals.workflows, 2);
    assert_eq!(report.totals.blocks, 2);
}

#[test]
fn live_services_need_urls() {
    let config = load_config(None).unwrap();

    let err = build_planner(&config, &data_file("sites.json"), None).err().unwrap();

    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn missing_config_file_is_an_io_error() {
    assert!(matches!(load_config(Some(&data_file("no_such_config.json"))), Err(Error::IoError(_))));
}
