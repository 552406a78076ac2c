//! Interface tests for the version publishing workflow using Cucumber.
//!
//! Scenarios describe which transitions are legal per dataset type and which
//! cascades each target state triggers. They run against the call-counting
//! mock store, so every scenario can also assert on lock and write traffic.
//!
//! ```bash
//! cargo test --test interfaces
//! ```

mod steps;

use cucumber::World;
use steps::workflow::WorkflowWorld;

#[tokio::main]
async fn main() {
    println!("\n=== Running Version Workflow Interface Tests ===\n");
    WorkflowWorld::cucumber()
        .fail_on_skipped()
        .run("tests/interfaces/features/version_workflow.feature")
        .await;
}
