use super::Environment;
use anyhow::Result;
use serde_json::json;
use wallet_core::payment::ReconcileOutcome;

pub fn run(env: &Environment, password: &str) -> Result<()> {
    let (mut engine, _clock) = env.virtual_engine()?;
    if !engine.stats().registered {
        println!("{}", serde_json::to_string_pretty(&engine.stats())?);
        return Ok(());
    }
    let code = engine.config().access.login_code.clone();
    engine.login(password, &code)?;

    let report = json!({
        "stats": engine.stats(),
        "stage": engine.stage_view(),
        "verification": engine.verification(),
        "transactions": engine.transactions(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    engine.logout();
    Ok(())
}

pub fn reconcile(
    env: &Environment,
    password: &str,
    transaction_id: &str,
    reject: Option<String>,
) -> Result<()> {
    let (mut engine, _clock) = env.virtual_engine()?;
    let code = engine.config().access.login_code.clone();
    engine.login(password, &code)?;

    let outcome = match reject {
        Some(reason) => ReconcileOutcome::Reject { reason },
        None => ReconcileOutcome::Approve,
    };
    let settled = engine.reconcile(transaction_id, outcome)?;
    println!("{}", serde_json::to_string_pretty(&settled)?);
    engine.logout();
    Ok(())
}
