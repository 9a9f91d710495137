//! Sensor feed demo: a broker, a publisher, and a subscriber in one binary.
//!
//! ```text
//! sensor-feed broker [addr]                  # default 0.0.0.0:5683
//! sensor-feed subscribe <addr> <topic>
//! sensor-feed publish <addr> <topic> <value>
//! ```

use std::env;

use wrenmq::prelude::*;

#[tokio::main]
async fn main() -> Result<(), WrenmqError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("broker") => {
            let addr = args
                .get(2)
                .map(String::as_str)
                .unwrap_or("0.0.0.0:5683");
            let server = BrokerServer::builder().bind(addr).build().await?;
            server.run().await
        }
        Some("subscribe") if args.len() >= 4 => {
            let (session, mut monitor) =
                Session::connect(&args[2], SessionConfig::default()).await?;
            let subscription = session.subscribe(&args[3]).await?;
            println!("subscribed to {}", subscription.topic());
            loop {
                tokio::select! {
                    value = subscription.recv() => match value {
                        Some(value) => {
                            println!("{} = {}", subscription.topic(), value)
                        }
                        None => break,
                    },
                    event = monitor.recv() => {
                        if let Some(SessionEvent::BrokerLost(e)) = event {
                            eprintln!("broker lost: {e}");
                        }
                        break;
                    }
                }
            }
            session.close().await;
            Ok(())
        }
        Some("publish") if args.len() >= 5 => {
            let (session, _monitor) =
                Session::connect(&args[2], SessionConfig::default()).await?;
            session.publish(&args[3], &args[4]).await?;
            println!("published {} = {}", args[3], args[4]);
            session.close().await;
            Ok(())
        }
        _ => {
            eprintln!(
                "usage: sensor-feed broker [addr]\n       \
                 sensor-feed subscribe <addr> <topic>\n       \
                 sensor-feed publish <addr> <topic> <value>"
            );
            Ok(())
        }
    }
}
