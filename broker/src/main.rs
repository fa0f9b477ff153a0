// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

use anyhow::{Context, Result};
use anywhere_broker::broker::CredentialBroker;
use anywhere_broker::configuration::{BrokerConfig, BrokerOptions};
use anywhere_broker::escalation::AssumedSession;
use anywhere_broker::exchange::ExchangeClient;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        // this needs to be set to remove duplicated information in the log.
        .with_current_span(false)
        // this needs to be set to false, otherwise ANSI color codes will
        // show up in a confusing manner in CloudWatch logs.
        .with_ansi(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        // remove the name of the function from every log entry
        .with_target(false)
        // stdout carries the verification result
        .with_writer(std::io::stderr)
        .init();

    let options = BrokerOptions::parse();

    tracing::info!("[broker] {:?}", &options);

    let provider = options.secret_provider()?;
    let config = BrokerConfig::from_provider(provider.as_ref())?;

    tracing::info!("[broker] {:?}", &config);

    let mut exchange = ExchangeClient::new(reqwest::Client::new());
    if let Some(endpoint_url) = &options.endpoint_url {
        exchange = exchange.with_endpoint(endpoint_url.as_str());
    }
    let mut broker = CredentialBroker::new(exchange);
    if let Some(sts_endpoint_url) = &options.sts_endpoint_url {
        broker = broker.with_sts_endpoint_url(sts_endpoint_url.as_str());
    }

    let session = broker.run(&config).await?;

    tracing::info!(
        "[broker] escalated session ready for {}",
        session.assumed_role_arn().unwrap_or("<unknown>")
    );

    if options.verify {
        verify(&session, options.sts_endpoint_url.as_deref()).await?;
    }

    Ok(())
}

/// Calls `GetCallerIdentity` with the escalated session and prints who we are.
async fn verify(session: &AssumedSession, sts_endpoint_url: Option<&str>) -> Result<()> {
    let client = match sts_endpoint_url {
        Some(endpoint_url) => session.client(|sdk_config| {
            let config = aws_sdk_sts::config::Builder::from(sdk_config)
                .endpoint_url(endpoint_url)
                .build();
            aws_sdk_sts::Client::from_conf(config)
        }),
        None => session.client(aws_sdk_sts::Client::new),
    };

    let identity = client
        .get_caller_identity()
        .send()
        .await
        .context("GetCallerIdentity with the escalated session failed")?;

    let output = serde_json::json!({
        "account": identity.account(),
        "arn": identity.arn(),
        "userId": identity.user_id(),
    });
    println!("{output}");

    Ok(())
}
