//! End-to-end pipeline runs against inline fixtures.

use recon_cli::pipeline::run_pipeline;
use recon_config::ClientConfig;

fn full_config() -> ClientConfig {
    let value = serde_json::json!({
        "name": "acme",
        "client_source": {
            "loader": {
                "type": "inline",
                "columns": ["CONTRATO", "PARCELA", "DOCUMENTO", "DATA_REFERENCIA", "VENCIMENTO"],
                "rows": [
                    ["C1", "1", "123.456.789-09", "2024-01-01", "2024-05-01"],
                    ["C2", "1", "12345678909", "2024-01-01", "2024-05-01"],
                    ["C2", "1", "12.345.678/0001-95", "2024-02-01", "2024-05-01"]
                ]
            },
            "key": { "type": "composite", "components": ["CONTRATO", "PARCELA"] }
        },
        "max_source": {
            "loader": {
                "type": "inline",
                "columns": ["CONTRATO", "PARCELA", "DOCUMENTO"],
                "rows": [
                    ["C1", "1", "12345678909"],
                    ["C9", "9", "99988877766"]
                ]
            },
            "key": { "type": "composite", "components": ["CONTRATO", "PARCELA"] }
        },
        "processors": [
            { "type": "tratamento" },
            { "type": "batimento" },
            { "type": "devolucao" },
            { "type": "baixa" },
            { "type": "enriquecimento" }
        ],
        "global": {
            "add_timestamp": false,
            "reference_date": "2024-06-01"
        }
    });
    serde_json::from_value(value).unwrap()
}

#[test]
fn full_run_produces_artifacts_for_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("output");
    let config = full_config();

    let result = run_pipeline(&config, dir.path(), &output_dir).unwrap();
    assert!(!result.has_errors, "errors: {:?}", result.errors);
    assert_eq!(result.stages.len(), 5);

    let by_stage = |name: &str| {
        result
            .stages
            .iter()
            .find(|stage| stage.stage == name)
            .unwrap()
    };
    // C2|1 deduped to the 14-digit row, then unmatched against the ledger.
    let batimento = by_stage("batimento");
    assert_eq!(batimento.records, 1);
    assert_eq!(
        batimento.metadata.get("demoted_duplicates").map(String::as_str),
        Some("1")
    );
    // C9|9 exists only on the ledger side.
    assert_eq!(by_stage("devolucao").records, 1);
    assert_eq!(by_stage("baixa").records, 1);
    assert_eq!(by_stage("enriquecimento").records, 1);

    for stage in ["batimento", "devolucao", "baixa", "enriquecimento"] {
        let artifacts = &by_stage(stage).output_files;
        assert!(!artifacts.is_empty(), "{stage} wrote no artifacts");
        for path in artifacts {
            assert!(path.exists());
            assert!(path.starts_with(output_dir.join(stage)));
        }
    }
}

#[test]
fn rerun_overwrites_prior_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("output");
    let config = full_config();

    let first = run_pipeline(&config, dir.path(), &output_dir).unwrap();
    let second = run_pipeline(&config, dir.path(), &output_dir).unwrap();

    let count = |result: &recon_cli::types::RunResult| {
        result
            .stages
            .iter()
            .map(|stage| stage.output_files.len())
            .sum::<usize>()
    };
    assert_eq!(count(&first), count(&second));
    // Same prefixes, no timestamp: the second run replaced the first run's
    // files instead of accumulating next to them.
    let batimento_files: Vec<_> = std::fs::read_dir(output_dir.join("batimento"))
        .unwrap()
        .flatten()
        .collect();
    // One unmatched row, one campaign, one default bucket: a single file.
    assert_eq!(batimento_files.len(), 1);
}

#[test]
fn loader_failure_marks_run_unsuccessful_but_stages_still_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = full_config();
    config.client_source.loader = recon_config::LoaderConfig::Csv {
        path: "nao_existe.csv".into(),
        separator: None,
        encoding: None,
    };

    let result = run_pipeline(&config, dir.path(), &dir.path().join("output")).unwrap();
    assert!(result.has_errors);
    assert!(result.errors.iter().any(|e| e.contains("client loader")));
    assert_eq!(result.stages.len(), 5);
    // The ledger side still flows: both reverse anti-joins see its rows.
    assert_eq!(
        result
            .stages
            .iter()
            .find(|stage| stage.stage == "devolucao")
            .unwrap()
            .records,
        2
    );
}
