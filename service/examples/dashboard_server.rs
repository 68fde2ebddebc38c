//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Minimal stand-in for the dashboard application: starts the ingestion
//! service on both unit ports, prints every dashboard change, and shuts
//! down on ctrl-c.

use daqlink_service::{FileSink, IngestConfig, RecordSink, Role, Supervisor};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = IngestConfig::new()
        .with_listener(Role::Primary, "0.0.0.0:8080".parse()?)
        .with_listener(Role::Secondary, "0.0.0.0:8081".parse()?);

    let supervisor = Supervisor::start(config, |role| {
        Ok(Box::new(FileSink::create(format!("telemetry-{role}.log"))?) as Box<dyn RecordSink>)
    })
    .await?;

    let mut dashboard = supervisor.dashboard();
    let printer = tokio::spawn(async move {
        while dashboard.changed().await.is_ok() {
            let state = *dashboard.borrow_and_update();
            println!(
                "power: {:6.1} V   speed: {:6.1} km/h   primary: {}   secondary: {}",
                state.power,
                state.speed,
                if state.primary_connected { "up" } else { "down" },
                if state.secondary_connected { "up" } else { "down" },
            );
        }
    });

    tokio::signal::ctrl_c().await?;
    supervisor.shutdown().await;
    printer.abort();

    Ok(())
}
