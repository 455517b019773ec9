use std::time::Duration;

use deploy_core::{
    cancel::{cancel_pair, CancelSignal},
    errors::StepError,
    executor::StepExecutor,
    orchestrator::{ContinuationPolicy, Orchestrator, RunOptions},
    record::{RunState, StepStatus},
    resolver::ResolvedArgument,
    spec::Step,
};
use deploy_tests::utils::{
    global_setup, linear_spec, rentable_spec, test_options, Behavior, StubLedger,
    TEST_CONFIRMATION_TIMEOUT,
};
use eyre::Result;
use tokio::time::{sleep, Instant};

#[tokio::test]
async fn test_executor_confirms_step() -> Result<()> {
    global_setup();

    let ledger = StubLedger::confirming();
    let executor = StepExecutor::new(&ledger, TEST_CONFIRMATION_TIMEOUT);
    let step = Step::new("nft", "SampleERC721", vec![]).with_label("ERC721");

    let args = vec![ResolvedArgument::Literal("Sample".to_string())];
    let result = executor
        .execute(&step, args.clone(), &CancelSignal::never())
        .await;

    assert_eq!(result.status(), StepStatus::Confirmed);
    assert_eq!(result.label(), "ERC721");
    assert_eq!(result.contract(), "SampleERC721");
    assert_eq!(result.args(), args.as_slice());
    assert_eq!(result.address(), Some(ledger.address_at(0)));
    assert_eq!(result.error(), None);

    Ok(())
}

#[tokio::test]
async fn test_ready_confirmation_survives_cancellation() -> Result<()> {
    global_setup();

    let ledger = StubLedger::confirming();
    let executor = StepExecutor::new(&ledger, TEST_CONFIRMATION_TIMEOUT);
    let step = Step::new("usdc", "TestERC20", vec![]);

    let (handle, signal) = cancel_pair();
    handle.cancel();

    let result = executor.execute(&step, vec![], &signal).await;

    assert_eq!(result.status(), StepStatus::Confirmed);
    assert_eq!(result.address(), Some(ledger.address_at(0)));
    assert_eq!(result.error(), None);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_hanging_confirmation_times_out() -> Result<()> {
    global_setup();

    let ledger = StubLedger::confirming().with_behavior("Rentable", Behavior::Hang);
    let orchestrator = Orchestrator::new(
        ledger,
        RunOptions {
            policy: ContinuationPolicy::HaltOnFailure,
            confirmation_timeout: Duration::from_secs(90),
        },
    );

    let start = Instant::now();
    let record = orchestrator.run(&rentable_spec()).await?;

    let rentable = &record.steps()[1];
    assert_eq!(rentable.status(), StepStatus::Failed);
    assert_eq!(rentable.error(), Some(&StepError::ConfirmationTimeout));
    assert!(rentable.transaction_hash().is_some());
    assert!(start.elapsed() >= Duration::from_secs(90));
    assert_eq!(record.state(), RunState::Completed);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancel_while_awaiting_confirmation() -> Result<()> {
    global_setup();

    let spec = linear_spec(3);
    let ledger = StubLedger::confirming().with_behavior("Contract1", Behavior::Hang);
    let orchestrator = Orchestrator::new(ledger, test_options(ContinuationPolicy::HaltOnFailure));

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        sleep(Duration::from_secs(5)).await;
        handle.cancel();
    });

    let start = Instant::now();
    let record = orchestrator.run_until_cancelled(&spec, signal).await?;

    // Cancellation lands well before the confirmation timeout would
    assert!(start.elapsed() < TEST_CONFIRMATION_TIMEOUT);
    assert_eq!(record.state(), RunState::Cancelled);

    let statuses: Vec<StepStatus> = record.steps().iter().map(|r| r.status()).collect();
    assert_eq!(
        statuses,
        vec![
            StepStatus::Confirmed,
            StepStatus::Cancelled,
            StepStatus::Cancelled
        ]
    );

    // The in-flight transaction is reported for reconciliation
    let in_flight = &record.steps()[1];
    assert_eq!(
        in_flight.transaction_hash(),
        Some(orchestrator.ledger().submissions()[1].transaction_hash)
    );
    assert_eq!(in_flight.error(), Some(&StepError::Cancelled));
    assert_eq!(record.steps()[2].transaction_hash(), None);
    assert_eq!(orchestrator.ledger().submissions().len(), 2);
    assert!(record.has_failures());

    Ok(())
}

#[tokio::test]
async fn test_cancel_before_run_contacts_no_ledger() -> Result<()> {
    global_setup();

    let orchestrator = Orchestrator::new(
        StubLedger::confirming(),
        test_options(ContinuationPolicy::HaltOnFailure),
    );
    let (handle, signal) = cancel_pair();
    handle.cancel();

    let record = orchestrator.run_until_cancelled(&rentable_spec(), signal).await?;

    assert_eq!(record.state(), RunState::Cancelled);
    assert_eq!(record.count(StepStatus::Cancelled), 2);
    assert_eq!(orchestrator.ledger().ledger_calls(), 0);

    Ok(())
}
