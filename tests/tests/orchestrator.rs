use alloy_primitives::address;
use deploy_core::{
    errors::StepError,
    orchestrator::{ContinuationPolicy, Orchestrator},
    record::{RunState, StepStatus},
    resolver::ResolvedArgument,
    spec::{Argument, DeploymentSpec, Step},
};
use deploy_tests::utils::{
    global_setup, linear_spec, rentable_spec, test_options, Behavior, StubLedger,
};
use eyre::{eyre, Result};

#[tokio::test]
async fn test_reference_receives_confirmed_address() -> Result<()> {
    global_setup();

    let orchestrator = Orchestrator::new(
        StubLedger::confirming(),
        test_options(ContinuationPolicy::HaltOnFailure),
    );
    let record = orchestrator.run(&rentable_spec()).await?;

    assert_eq!(record.state(), RunState::Completed);
    assert!(record.is_success());

    let usdc = record.get("usdc").ok_or_else(|| eyre!("missing usdc"))?;
    let rentable = record
        .get("rentable")
        .ok_or_else(|| eyre!("missing rentable"))?;
    let usdc_address = usdc
        .confirmed_address()
        .ok_or_else(|| eyre!("usdc not confirmed"))?;

    assert_eq!(usdc_address, orchestrator.ledger().address_at(0));
    assert_eq!(rentable.address(), Some(orchestrator.ledger().address_at(1)));
    assert!(usdc.transaction_hash().is_some());

    let expected_args = vec![
        ResolvedArgument::Address(usdc_address),
        ResolvedArgument::Literal("5".to_string()),
    ];
    assert_eq!(rentable.args(), expected_args.as_slice());

    let submissions = orchestrator.ledger().submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[1].contract, "Rentable");
    assert_eq!(submissions[1].args, expected_args);
    assert_eq!(rentable.transaction_hash(), Some(submissions[1].transaction_hash));

    Ok(())
}

#[tokio::test]
async fn test_halt_on_failure_skips_remaining_steps() -> Result<()> {
    global_setup();

    let spec = DeploymentSpec::new(vec![
        Step::new("token", "TestERC20", vec![Argument::literal("USDC")]),
        Step::new("nft", "SampleERC721", vec![]),
        Step::new("registry", "Registry", vec![]),
    ]);
    let ledger = StubLedger::confirming().with_behavior(
        "TestERC20",
        Behavior::RejectSubmission("insufficient funds".to_string()),
    );

    let orchestrator = Orchestrator::new(ledger, test_options(ContinuationPolicy::HaltOnFailure));
    let record = orchestrator.run(&spec).await?;

    let statuses: Vec<StepStatus> = record.steps().iter().map(|r| r.status()).collect();
    assert_eq!(
        statuses,
        vec![StepStatus::Failed, StepStatus::Skipped, StepStatus::Skipped]
    );
    assert_eq!(
        record.steps()[0].error(),
        Some(&StepError::SubmissionError("insufficient funds".to_string()))
    );
    assert_eq!(record.steps()[0].transaction_hash(), None);
    assert_eq!(record.steps()[1].error(), None);

    assert!(orchestrator.ledger().submitted_contracts().is_empty());
    assert_eq!(orchestrator.ledger().ledger_calls(), 1);
    assert_eq!(record.state(), RunState::Completed);
    assert!(record.has_failures());

    Ok(())
}

#[tokio::test]
async fn test_continue_independent_runs_unrelated_steps() -> Result<()> {
    global_setup();

    let spec = DeploymentSpec::new(vec![
        Step::new("token", "TestERC20", vec![]),
        Step::new("nft", "SampleERC721", vec![]),
    ]);
    let ledger = StubLedger::confirming()
        .with_behavior("TestERC20", Behavior::RejectSubmission("nonce too low".to_string()));

    let orchestrator =
        Orchestrator::new(ledger, test_options(ContinuationPolicy::ContinueIndependent));
    let record = orchestrator.run(&spec).await?;

    assert_eq!(record.steps()[0].status(), StepStatus::Failed);
    assert_eq!(record.steps()[1].status(), StepStatus::Confirmed);
    assert_eq!(
        orchestrator.ledger().submitted_contracts(),
        vec!["SampleERC721".to_string()]
    );

    Ok(())
}

#[tokio::test]
async fn test_continue_independent_skips_transitive_dependents() -> Result<()> {
    global_setup();

    let spec = DeploymentSpec::new(vec![
        Step::new("oracle", "Oracle", vec![]),
        Step::new("market", "Market", vec![Argument::address_of("oracle")]),
        Step::new("router", "Router", vec![Argument::address_of("market")]),
        Step::new("token", "TestERC20", vec![Argument::literal("USDC")]),
        Step::new(
            "vault",
            "Vault",
            vec![Argument::address_of("token"), Argument::address_of("router")],
        ),
    ]);
    let ledger = StubLedger::confirming().with_behavior("Oracle", Behavior::Revert);

    let orchestrator =
        Orchestrator::new(ledger, test_options(ContinuationPolicy::ContinueIndependent));
    let record = orchestrator.run(&spec).await?;

    let oracle = &record.steps()[0];
    assert_eq!(oracle.status(), StepStatus::Failed);
    assert_eq!(oracle.error(), Some(&StepError::TransactionReverted));
    assert!(oracle.transaction_hash().is_some());

    assert_eq!(record.steps()[1].status(), StepStatus::Skipped);
    assert_eq!(
        record.steps()[1].error(),
        Some(&StepError::DependencyFailed {
            step: "oracle".to_string()
        })
    );
    assert_eq!(record.steps()[2].status(), StepStatus::Skipped);
    assert_eq!(
        record.steps()[2].error(),
        Some(&StepError::DependencyFailed {
            step: "market".to_string()
        })
    );
    assert_eq!(record.steps()[3].status(), StepStatus::Confirmed);
    assert_eq!(record.steps()[4].status(), StepStatus::Skipped);

    assert_eq!(
        orchestrator.ledger().submitted_contracts(),
        vec!["Oracle".to_string(), "TestERC20".to_string()]
    );
    assert_eq!(record.state(), RunState::Completed);

    Ok(())
}

#[tokio::test]
async fn test_dropped_transaction_fails_step() -> Result<()> {
    global_setup();

    let ledger = StubLedger::confirming().with_behavior("Rentable", Behavior::Drop);
    let orchestrator = Orchestrator::new(ledger, test_options(ContinuationPolicy::HaltOnFailure));
    let record = orchestrator.run(&rentable_spec()).await?;

    assert_eq!(record.steps()[0].status(), StepStatus::Confirmed);
    assert_eq!(record.steps()[1].status(), StepStatus::Failed);
    assert_eq!(
        record.steps()[1].error(),
        Some(&StepError::TransactionDropped)
    );
    assert_eq!(record.steps()[1].address(), None);

    Ok(())
}

#[tokio::test]
async fn test_structural_idempotence_across_fresh_ledgers() -> Result<()> {
    global_setup();

    let spec = linear_spec(4);
    let first = Orchestrator::new(
        StubLedger::new(address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8")),
        test_options(ContinuationPolicy::HaltOnFailure),
    )
    .run(&spec)
    .await?;
    let second = Orchestrator::new(
        StubLedger::new(address!("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC")),
        test_options(ContinuationPolicy::HaltOnFailure),
    )
    .run(&spec)
    .await?;

    let shape = |record: &deploy_core::record::DeploymentRecord| {
        record
            .steps()
            .iter()
            .map(|r| (r.step_id().to_string(), r.status()))
            .collect::<Vec<_>>()
    };
    assert_eq!(shape(&first), shape(&second));

    for (a, b) in first.steps().iter().zip(second.steps()) {
        assert!(a.address().is_some() && b.address().is_some());
        assert_ne!(a.address(), b.address());
    }

    // Each step received its own predecessor's address from its own run
    for record in [&first, &second] {
        for pair in record.steps().windows(2) {
            let previous = pair[0].confirmed_address().ok_or_else(|| eyre!("unconfirmed"))?;
            assert_eq!(pair[1].args(), &[ResolvedArgument::Address(previous)]);
        }
    }

    Ok(())
}
