//! Simple SDK Example
//!
//! Demonstrates basic usage of the Cyborg SDK.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package cyborg-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --example simple
//!    ```

use cyborg_sdk::CyborgClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Cyborg SDK - Simple Example");
    println!("===========================\n");

    // 1. Connect to daemon
    println!("1. Connecting to daemon...");
    let client = CyborgClient::connect("http://127.0.0.1:9527").await?;
    let health = client.health().await?;
    println!(
        "   ✓ Connected (v{}, default timeout {} ms)\n",
        health.version, health.default_timeout_ms
    );

    // 2. Arguments with spaces and shell metacharacters arrive untouched
    println!("2. Running printf with tricky arguments...");
    let response = client
        .run("printf", ["%s\\n", "a b", "$(echo x)", "*"])
        .await?;
    println!("   ✓ returncode: {}", response.returncode);
    for line in response.stdout.lines() {
        println!("     | {}", line);
    }
    println!();

    // 3. A script that outlives its budget
    println!("3. Running sleep with a 500 ms timeout...");
    let response = client.run_with_timeout("sleep", ["5"], 500).await?;
    if response.is_sentinel() {
        println!("   ✓ Runner gave up: {}", response.stderr);
    }
    println!();

    // 4. A script that does not exist
    println!("4. Running a missing script...");
    let response = client
        .run("/nonexistent/script", Vec::<String>::new())
        .await?;
    println!(
        "   ✓ returncode {} with reason: {}",
        response.returncode, response.stderr
    );

    println!("\n✓ Example completed successfully!");

    Ok(())
}
