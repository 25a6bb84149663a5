use gridflux::algs::halo::Side;
use gridflux::boundary::BoundaryZone;
use gridflux::grid_error::GridError;
use gridflux::implicit::{JacobianConfig, JacobianMode};
use gridflux::physics::ModelConfig;
use gridflux::solver::SolverConfig;

#[test]
fn minimal_json_takes_defaults() {
    let cfg: SolverConfig = serde_json::from_str(r#"{ "size": [40] }"#).unwrap();
    assert_eq!(cfg.model, ModelConfig::Euler1D { gamma: 1.4 });
    assert_eq!(cfg.upwinding, "roe");
    assert_eq!(cfg.reconstruction, "1");
    assert_eq!(cfg.first_derivative, "2");
    assert_eq!(cfg.second_derivative, "2");
    assert_eq!(cfg.jacobian, JacobianConfig::default());
    assert_eq!(cfg.jacobian.jfnk_eps, 1e-6);
    assert!(cfg.validate().is_ok());
}

#[test]
fn full_config_round_trips() {
    let cfg = SolverConfig {
        model: ModelConfig::Euler2D { gamma: 1.3 },
        size: vec![32, 16],
        iproc: vec![2, 1],
        periodic: vec![false, true],
        xmin: vec![-1.0, 0.0],
        xmax: vec![1.0, 0.5],
        upwinding: "llf-char".into(),
        reconstruction: "weno5".into(),
        boundaries: vec![
            BoundaryZone::Extrapolate {
                dim: 0,
                face: Side::Low,
            },
            BoundaryZone::Sponge {
                dim: 0,
                face: Side::High,
                reference: vec![1.0, 0.0, 0.0, 2.5],
                xmin: vec![0.8, 0.0],
                xmax: vec![1.0, 0.5],
                strength: 4.0,
            },
        ],
        jacobian: JacobianConfig {
            mode: JacobianMode::Linear,
            jfnk_eps: 1e-7,
        },
        ..Default::default()
    };
    let text = serde_json::to_string_pretty(&cfg).unwrap();
    assert!(text.contains(r#""type": "sponge""#));
    assert!(text.contains(r#""mode": "linear""#));
    let back: SolverConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn hand_written_zones_and_models_parse() {
    let text = r#"{
        "model": { "name": "shallow-water1d" },
        "size": [20],
        "upwinding": "rf-char",
        "boundaries": [
            { "type": "dirichlet", "dim": 0, "face": "low", "value": [1.0, 0.0] },
            { "type": "sponge", "dim": 0, "face": "high", "reference": [1.0, 0.0],
              "xmin": [0.9], "xmax": [1.0] }
        ],
        "jacobian": { "mode": "jfnk" }
    }"#;
    let cfg: SolverConfig = serde_json::from_str(text).unwrap();
    assert_eq!(cfg.model, ModelConfig::ShallowWater1D { gravity: 9.81 });
    match &cfg.boundaries[1] {
        BoundaryZone::Sponge { strength, .. } => assert_eq!(*strength, 1.0),
        other => panic!("expected a sponge, got {other:?}"),
    }
    let resolved = cfg.validate().unwrap();
    assert_eq!(resolved.nvars, 2);
}

#[test]
fn invalid_choices_are_fatal() {
    let bad = [
        SolverConfig {
            upwinding: "godunov".into(),
            ..Default::default()
        },
        SolverConfig {
            reconstruction: "weno7".into(),
            ..Default::default()
        },
        SolverConfig {
            first_derivative: "3".into(),
            ..Default::default()
        },
        SolverConfig {
            size: vec![16, 16],
            ..Default::default()
        },
        SolverConfig {
            iproc: vec![1, 1],
            ..Default::default()
        },
        SolverConfig {
            jacobian: JacobianConfig {
                jfnk_eps: 0.0,
                ..Default::default()
            },
            ..Default::default()
        },
    ];
    for cfg in bad {
        assert!(
            matches!(cfg.validate(), Err(GridError::Config(_))),
            "{cfg:?} should be rejected"
        );
    }
}

#[test]
fn zone_with_wrong_state_size_is_rejected() {
    let cfg = SolverConfig {
        boundaries: vec![BoundaryZone::Dirichlet {
            dim: 0,
            face: Side::High,
            value: vec![1.0, 2.0],
        }],
        ..Default::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn unknown_model_name_fails_to_parse() {
    let res: Result<SolverConfig, _> = serde_json::from_str(r#"{ "model": { "name": "mhd" } }"#);
    assert!(res.is_err());
}
