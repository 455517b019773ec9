use deploy_core::{
    errors::{OrchestratorError, SpecViolation},
    orchestrator::{ContinuationPolicy, Orchestrator},
    spec::{Argument, DeploymentSpec, Step},
};
use deploy_tests::utils::{global_setup, linear_spec, rentable_spec, test_options, StubLedger};
use eyre::Result;

#[tokio::test]
async fn test_strictly_earlier_references_validate() -> Result<()> {
    global_setup();

    // A diamond: both middle steps reference the root, the last references both
    let diamond = DeploymentSpec::new(vec![
        Step::new("root", "Root", vec![]),
        Step::new("left", "Left", vec![Argument::address_of("root")]),
        Step::new("right", "Right", vec![Argument::address_of("root")]),
        Step::new(
            "join",
            "Join",
            vec![
                Argument::address_of("left"),
                Argument::literal("1"),
                Argument::address_of("right"),
            ],
        ),
    ]);

    for spec in [linear_spec(1), linear_spec(6), rentable_spec(), diamond] {
        assert!(spec.validate().is_ok());

        let orchestrator = Orchestrator::new(
            StubLedger::confirming(),
            test_options(ContinuationPolicy::HaltOnFailure),
        );
        let record = orchestrator.run(&spec).await?;
        assert!(record.is_success());
        assert_eq!(record.steps().len(), spec.len());
    }

    Ok(())
}

#[tokio::test]
async fn test_forward_reference_aborts_without_ledger_calls() -> Result<()> {
    global_setup();

    let spec = DeploymentSpec::new(vec![
        Step::new("rentable", "Rentable", vec![Argument::address_of("usdc")]),
        Step::new("usdc", "TestERC20", vec![]),
    ]);

    let orchestrator = Orchestrator::new(
        StubLedger::confirming(),
        test_options(ContinuationPolicy::HaltOnFailure),
    );
    let err = orchestrator.run(&spec).await.unwrap_err();

    let OrchestratorError::InvalidSpec(violations) = err;
    assert_eq!(
        violations,
        vec![SpecViolation::ForwardReference {
            step: "rentable".to_string(),
            target: "usdc".to_string(),
        }]
    );
    assert_eq!(orchestrator.ledger().ledger_calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_every_violation_is_listed() -> Result<()> {
    global_setup();

    let spec = DeploymentSpec::new(vec![
        Step::new("usdc", "TestERC20", vec![]),
        Step::new("usdc", "TestERC20", vec![]),
        Step::new("market", "Rentable", vec![Argument::address_of("oracle")]),
        Step::new("vault", "Vault", vec![Argument::address_of("vault")]),
    ]);

    let orchestrator = Orchestrator::new(
        StubLedger::confirming(),
        test_options(ContinuationPolicy::ContinueIndependent),
    );
    let OrchestratorError::InvalidSpec(violations) = orchestrator.run(&spec).await.unwrap_err();

    assert_eq!(violations.len(), 3);
    assert!(violations
        .iter()
        .any(|v| matches!(v, SpecViolation::DuplicateId { id, .. } if id == "usdc")));
    assert!(violations
        .iter()
        .any(|v| matches!(v, SpecViolation::UnknownReference { target, .. } if target == "oracle")));
    assert!(violations
        .iter()
        .any(|v| matches!(v, SpecViolation::ForwardReference { target, .. } if target == "vault")));
    assert_eq!(orchestrator.ledger().ledger_calls(), 0);

    Ok(())
}
