use anyhow::Result;
use dotenv::dotenv;

use entra_token_gen::error::Cancelled;
use entra_token_gen::session::Session;
use entra_token_gen::{auth, tracing as tracing_setup};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_setup::init_tracing("entra_token_gen=warn")?;

    match run().await {
        Ok(()) => Ok(()),
        Err(err) if Cancelled::caused(&err) => {
            println!("Operation was cancelled by the user.");
            Ok(())
        }
        // The runtime prints the full context chain from the returned
        // error; printing it here as well would duplicate it.
        Err(err) => Err(err),
    }
}

async fn run() -> Result<()> {
    let credential = auth::select_credential()?;
    let mut session = Session::new(credential)?;
    session.run().await
}
