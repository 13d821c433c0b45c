//! Example: Drive the dispatcher against the in-memory backend
//!
//! Logs in, creates a container, uploads a few files, lists and inspects
//! them, downloads one back, purges the container and logs out. Every
//! callback notification is printed as one JSON line.
//!
//! Usage:
//!   cargo run --example browse [-- FILE...]
//!
//! Without arguments a handful of temporary files are uploaded.

use std::path::PathBuf;
use std::sync::Arc;

use cloudie::{
    CallbackEvent, ChannelCallback, CloudieOperations, CommandDispatcher, Container,
    ContainerSpecification, Credentials, MemoryBackend, OperationsConfig, StoredObject,
};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cloudie=debug"));
    fmt().with_env_filter(filter).with_target(false).init();
}

/// Print events until `Done`, returning everything seen.
async fn print_until_done(events: &mut mpsc::UnboundedReceiver<CallbackEvent>) -> Vec<CallbackEvent> {
    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("Failed to encode event: {}", e),
        }
        let done = event == CallbackEvent::Done;
        seen.push(event);
        if done {
            break;
        }
    }
    seen
}

fn listed_objects(events: &[CallbackEvent]) -> Vec<StoredObject> {
    events
        .iter()
        .filter_map(|event| match event {
            CallbackEvent::AppendStoredObjects { objects, .. } => Some(objects.clone()),
            _ => None,
        })
        .flatten()
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let scratch = tempfile::tempdir()?;
    let mut files: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if files.is_empty() {
        for (name, body) in [
            ("readme.txt", "hello from cloudie"),
            ("data.json", "{\"answer\": 42}"),
            ("page.html", "<p>hi</p>"),
        ] {
            let path = scratch.path().join(name);
            std::fs::write(&path, body)?;
            files.push(path);
        }
        // Directories are skipped on upload.
        files.push(scratch.path().to_path_buf());
    }

    let backend = MemoryBackend::new().with_user("demo", "demo", "demo");
    let ops = CloudieOperations::new(backend)?
        .with_config(OperationsConfig::default().with_page_size(2))?;
    let dispatcher = CommandDispatcher::new(Arc::new(ops))?;
    let (callback, mut events) = ChannelCallback::shared();
    let container = Container::absent("demo");

    println!("# login");
    let credentials = Credentials::new("http://localhost:8080/auth/v1.0", "demo", "demo", "demo");
    dispatcher.login(credentials, Some(callback.clone()))?;
    print_until_done(&mut events).await;

    println!("# create container");
    dispatcher.create_container(
        Some(ContainerSpecification::new("demo", false)),
        Some(callback.clone()),
    )?;
    print_until_done(&mut events).await;

    println!("# upload");
    dispatcher.create_stored_objects(container.clone(), files, Some(callback.clone()))?;
    let uploaded = listed_objects(&print_until_done(&mut events).await);

    if let Some(first) = uploaded.first() {
        println!("# metadata");
        dispatcher.get_object_metadata(first.clone(), Some(callback.clone()))?;
        print_until_done(&mut events).await;

        println!("# download");
        let target = scratch.path().join(format!("downloaded-{}", first.name));
        dispatcher.download_stored_object(
            container.clone(),
            first.clone(),
            target.clone(),
            Some(callback.clone()),
        )?;
        print_until_done(&mut events).await;
        println!("# downloaded {} bytes", std::fs::metadata(&target)?.len());
    }

    println!("# refresh");
    dispatcher.refresh_containers(Some(callback.clone()))?;
    print_until_done(&mut events).await;

    println!("# purge");
    dispatcher.purge_container(container, Some(callback.clone()))?;
    print_until_done(&mut events).await;

    println!("# logout");
    dispatcher.logout(Some(callback))?;
    print_until_done(&mut events).await;

    Ok(())
}
