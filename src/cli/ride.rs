use std::{
    io::{self, Write},
    sync::Arc,
};

use ansi_term::Style;
use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    journey::{
        controller::{TapOutcome, TimerFrame, TripController},
        display::DisplayJourney,
        storage::kv_storage::KeyValueStore,
        ticker::{ElapsedTicker, TimerView, DEFAULT_TICK_INTERVAL},
        Journey,
    },
    trip::{contrast_text_color, CommuteKind},
    utils::clock::Clock,
};

use super::{records::write_journey, shutdown::detect_shutdown};

/// Input that leaves the timer screen while keeping the trip running.
const LEAVE_COMMAND: &str = "q";

/// How the timer screen was left.
#[derive(Debug, PartialEq, Eq)]
pub enum ScreenExit {
    /// The final tap sealed this journey.
    Completed(Journey),
    /// The user walked away. The trip stays in progress and is resumed next time.
    Left,
}

/// Paints the timer screen on a terminal line: phase color as background, contrast color as text.
pub struct TerminalView<W> {
    out: W,
    kind: CommuteKind,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, kind: CommuteKind) -> Self {
        Self { out, kind }
    }
}

impl<W: Write> TimerView for TerminalView<W> {
    fn render(&mut self, frame: &TimerFrame) -> Result<()> {
        let style = Style::new()
            .on(frame.background.into())
            .fg(frame.text.into())
            .bold();
        write!(
            self.out,
            "\r{}",
            style.paint(format!("   {}   {}   ", self.kind, frame.elapsed))
        )?;
        self.out.flush()?;
        Ok(())
    }
}

/// Runs the `ride` command: the timer screen. Every line on stdin is a tap.
pub async fn process_ride_command<K: KeyValueStore>(
    controller: Arc<TripController<K>>,
    kind: CommuteKind,
    clock: impl Clock + Clone,
) -> Result<()> {
    let trip = controller
        .start_or_resume_trip(kind, clock.epoch_millis())
        .await?;

    println!(
        "{} journey {}. Press Enter to mark a leg, {LEAVE_COMMAND} and Enter to leave it running.",
        trip.kind, trip.journey_id
    );

    let shutdown = CancellationToken::new();
    let ticker = ElapsedTicker::new(
        controller.clone(),
        Box::new(TerminalView::new(io::stdout(), trip.kind)),
        shutdown.clone(),
        DEFAULT_TICK_INTERVAL,
        Box::new(clock.clone()),
    );

    let (_, ticker_result, exit) = tokio::join!(
        detect_shutdown(shutdown.clone()),
        ticker.run(),
        read_taps(
            controller.as_ref(),
            trip.kind,
            BufReader::new(tokio::io::stdin()),
            &shutdown,
            &clock,
        ),
    );
    println!();

    ticker_result?;
    match exit? {
        ScreenExit::Completed(journey) => {
            println!("Journey complete.");
            write_journey(&mut io::stdout(), &DisplayJourney::from_journey(&journey))?;
        }
        ScreenExit::Left => {
            println!("Trip is still running, `ride` picks it up again.");
        }
    }
    Ok(())
}

/// Records a tap for every line of `input` until the journey completes, the user leaves, or
/// `shutdown` is cancelled from elsewhere. Always cancels `shutdown` on return so the rest of the
/// screen stops with it.
pub async fn read_taps<K: KeyValueStore>(
    controller: &TripController<K>,
    kind: CommuteKind,
    input: impl AsyncBufRead + Unpin,
    shutdown: &CancellationToken,
    clock: &impl Clock,
) -> Result<ScreenExit> {
    let result = tap_loop(controller, kind, input, shutdown, clock).await;
    shutdown.cancel();
    result
}

async fn tap_loop<K: KeyValueStore>(
    controller: &TripController<K>,
    kind: CommuteKind,
    input: impl AsyncBufRead + Unpin,
    shutdown: &CancellationToken,
    clock: &impl Clock,
) -> Result<ScreenExit> {
    let mut lines = input.lines();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => return Ok(ScreenExit::Left),
            line = lines.next_line() => line?,
        };

        match line.as_deref().map(str::trim) {
            None | Some(LEAVE_COMMAND) => {
                info!("Leaving the timer screen with the trip running");
                return Ok(ScreenExit::Left);
            }
            Some(_) => match controller.record_tap(kind, clock.epoch_millis()).await? {
                TapOutcome::Continue(color) => debug!("Next phase is shown in {color}"),
                TapOutcome::Complete(journey) => return Ok(ScreenExit::Completed(journey)),
            },
        }
    }
}

/// Runs the `tap` command: a single tap without the timer screen.
pub async fn process_tap_command<K: KeyValueStore>(
    controller: &TripController<K>,
    kind: CommuteKind,
    clock: &impl Clock,
) -> Result<()> {
    match controller.record_tap(kind, clock.epoch_millis()).await? {
        TapOutcome::Continue(color) => {
            let trip = controller.active_trip();
            let taps = trip.as_ref().map_or(0, |trip| trip.tap_count);
            let kind = trip.map_or(kind, |trip| trip.kind);
            println!(
                "{}",
                Style::new()
                    .on(color.into())
                    .fg(contrast_text_color(color).into())
                    .paint(format!(" {kind}: tap {taps} recorded "))
            );
        }
        TapOutcome::Complete(journey) => {
            println!("Journey complete.");
            write_journey(&mut io::stdout(), &DisplayJourney::from_journey(&journey))?;
        }
    }
    Ok(())
}

/// Runs the `status` command.
pub fn print_status<K: KeyValueStore>(controller: &TripController<K>, clock: &impl Clock) {
    match controller.active_trip() {
        Some(trip) => {
            let phase = trip
                .kind
                .leg_labels()
                .get(trip.tap_count.saturating_sub(1))
                .copied()
                .unwrap_or_default();
            println!(
                "{} journey {} in progress: {}/{} taps, {} for {}",
                trip.kind,
                trip.journey_id,
                trip.tap_count,
                trip.kind.completion_threshold().unwrap_or_default(),
                phase,
                controller.elapsed_display(clock.epoch_millis()),
            );
        }
        None => println!("No trip in progress."),
    }
}
