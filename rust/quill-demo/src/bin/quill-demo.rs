use anyhow::Result;
use clap::Parser;
use quill_demo::{DemoCli, WalkthroughOptions, run};
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = DemoCli::parse();
    let settings = cli.settings()?;
    let walkthrough = run(
        settings,
        WalkthroughOptions {
            foo: cli.foo,
            namespace: cli.namespace,
            expired: cli.expired,
        },
    )
    .await?;

    println!("controller:  {}", walkthrough.controller);
    println!("dapp:        {}", walkthrough.dapp);
    println!("namespace:   {}", walkthrough.namespace);
    println!("document:    {}", walkthrough.document);
    println!(
        "capability:  {} valid {}",
        walkthrough.capability.reference(),
        walkthrough.capability.window()
    );
    match &walkthrough.outcome {
        Ok(head) => println!("committed:   {head}"),
        Err(error) => println!("rejected:    {error}"),
    }
    println!("commits:");
    for commit in &walkthrough.commits {
        println!("  {commit}");
    }
    println!("content:     {}", walkthrough.content);

    if walkthrough.outcome.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
