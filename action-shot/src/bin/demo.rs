use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use action_shot::ACTION_ATTRIBUTE;
use action_shot::ActionDescriptorParser;
use action_shot::Application;
use action_shot::CONTROLLER_ATTRIBUTE;
use action_shot::Controller;
use action_shot::Element;
use action_shot::Event;
use action_shot::Method;
use action_shot::extend_application_with_throttle;
use action_shot::parse_throttle_modifier;
use clap::Parser;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

/// Fire a burst of events at a controller and report how many reached it.
#[derive(Debug, Parser)]
#[command(name = "action-shot-demo")]
struct Args {
    /// Action descriptor bound on the demo element.
    #[arg(long, default_value = "scroll->gallery#onScroll:throttle:200ms")]
    action: String,

    /// Number of events to dispatch.
    #[arg(long, default_value_t = 50)]
    events: usize,

    /// Gap between dispatched events.
    #[arg(long, default_value = "10ms", value_parser = humantime::parse_duration)]
    interval: Duration,
}

struct Gallery {
    element: Element,
    started: Instant,
    calls: AtomicUsize,
}

impl Gallery {
    fn on_scroll(&self, event: &Event) {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        println!(
            "{:>6.0?}  call {n:>3}  event {} #{}",
            self.started.elapsed(),
            event.kind(),
            event.detail()
        );
    }
}

impl Controller for Gallery {
    fn new(element: Element) -> Self {
        Self {
            element,
            started: Instant::now(),
            calls: AtomicUsize::new(0),
        }
    }

    fn element(&self) -> &Element {
        &self.element
    }

    fn method(name: &str) -> Option<Method<Self>> {
        match name {
            "onScroll" | "onClick" | "onInput" => Some(Gallery::on_scroll),
            _ => None,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("action_shot=debug")),
        )
        .init();

    let args = Args::parse();
    let config = parse_throttle_modifier(&args.action);
    match &config {
        Some(config) => println!("throttle: {config:?}"),
        None => println!("throttle: none (every event is delivered)"),
    }

    let application = extend_application_with_throttle(Application::new());
    application.register_throttle_modifiers();
    application.register::<Gallery>("gallery")?;

    let element = Element::new();
    element.set_attribute(CONTROLLER_ATTRIBUTE, "gallery");
    element.set_attribute(ACTION_ATTRIBUTE, args.action.as_str());
    application.mount(&element)?;

    let Some(action) = application.action_parser().parse_all(&args.action).into_iter().next() else {
        return Err(format!("not an action descriptor: {}", args.action).into());
    };

    for n in 0..args.events {
        element.dispatch_event(&Event::with_detail(action.event_name.as_str(), n.into()));
        sleep(args.interval).await;
    }

    // Let any trailing call land before reporting.
    sleep(config.map(|c| c.delay).unwrap_or_default()).await;

    let gallery = application
        .controller_for::<Gallery>(&element, "gallery")
        .ok_or("gallery controller did not connect")?;
    println!(
        "dispatched {} events, handler ran {} times",
        args.events,
        gallery.calls.load(Ordering::SeqCst)
    );

    application.stop();
    Ok(())
}
