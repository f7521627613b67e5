//! The `run` command: drives the engine from real interval sources.
//!
//! Three triggers exist at the scheduling level, each an owned handle this
//! loop starts and cancels on the engine's command:
//!
//! 1. the 1-second countdown clock (recreated on every `StartClock`, so a
//!    stale clock can never keep firing alongside a fresh one),
//! 2. the 0.5-second break color pulse, armed only during the break phase,
//! 3. the keep-awake lock, held while running and dropped on teardown.
//!
//! Enter toggles pause, `r` resets, `q` or Ctrl-C quits. Quitting tears
//! everything down regardless of state.

use std::io::Write;
use std::time::Duration;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, Interval};
use tracing::debug;

use cadence_core::{
    BreakPulse, Command, CommandRunner, Config, Cue, Event, IntervalTimerEngine, KeepAwake,
    Phase, PulseColor, TimerConfig,
};

use crate::collab::{InhibitKeepAwake, NoopKeepAwake, TerminalCuePlayer};

const CLOCK_PERIOD: Duration = Duration::from_secs(1);
const PULSE_PERIOD: Duration = Duration::from_millis(500);

#[derive(Args)]
pub struct RunArgs {
    /// Active interval length in seconds
    #[arg(long, short = 'd')]
    pub duration: Option<u32>,
    /// Break length in seconds
    #[arg(long)]
    pub break_duration: Option<u32>,
    /// Start paused; press Enter to begin
    #[arg(long)]
    pub paused: bool,
    /// Mute audio cues
    #[arg(long)]
    pub silent: bool,
    /// Hold a systemd-inhibit lock while the countdown runs
    #[arg(long)]
    pub keep_awake: bool,
    /// Emit JSON event lines instead of the interactive display
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let timer_config = TimerConfig {
        active_secs: args.duration.unwrap_or(config.timer.default_active_secs),
        break_secs: args.break_duration.unwrap_or(config.timer.break_secs),
        break_cue: config.timer.break_cue,
    };
    let engine = IntervalTimerEngine::new(timer_config)?;

    let audible = config.sound.enabled && !args.silent;
    let keep_awake: Box<dyn KeepAwake> = if args.keep_awake {
        Box::new(InhibitKeepAwake::new())
    } else {
        Box::new(NoopKeepAwake)
    };
    let runner = CommandRunner::new(TerminalCuePlayer::new(audible), keep_awake);
    let session = Session::new(engine, runner, args.json);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(event_loop(session, args.paused));
    Ok(())
}

fn clock_interval() -> Interval {
    tokio::time::interval_at(Instant::now() + CLOCK_PERIOD, CLOCK_PERIOD)
}

fn pulse_interval() -> Interval {
    tokio::time::interval_at(Instant::now() + PULSE_PERIOD, PULSE_PERIOD)
}

async fn event_loop(mut session: Session, start_paused: bool) {
    let mut clock = clock_interval();
    let mut clock_armed = false;
    let mut pulse_timer = pulse_interval();
    let mut pulse_armed = false;

    let apply = |triggers: Vec<Command>,
                     clock: &mut Interval,
                     clock_armed: &mut bool,
                     pulse_timer: &mut Interval,
                     pulse_armed: &mut bool| {
        for trigger in triggers {
            match trigger {
                Command::StartClock => {
                    // Replace, never stack: the previous interval is dropped.
                    *clock = clock_interval();
                    *clock_armed = true;
                }
                Command::StopClock => *clock_armed = false,
                Command::StartBreakPulse => {
                    *pulse_timer = pulse_interval();
                    *pulse_armed = true;
                }
                Command::StopBreakPulse => *pulse_armed = false,
                _ => {}
            }
        }
    };

    if start_paused {
        session.show_initial_state();
    } else {
        let triggers = session.toggle_running();
        apply(
            triggers,
            &mut clock,
            &mut clock_armed,
            &mut pulse_timer,
            &mut pulse_armed,
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = clock.tick(), if clock_armed => {
                let triggers = session.on_clock();
                apply(triggers, &mut clock, &mut clock_armed, &mut pulse_timer, &mut pulse_armed);
            }
            _ = pulse_timer.tick(), if pulse_armed => {
                session.on_pulse();
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        let (keep_going, triggers) = session.on_input(line.trim());
                        apply(triggers, &mut clock, &mut clock_armed, &mut pulse_timer, &mut pulse_armed);
                        if !keep_going {
                            break;
                        }
                    }
                    // Stdin closed (piped input); keep the timer running.
                    Ok(None) | Err(_) => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupt received");
                break;
            }
        }
    }

    session.shutdown();
}

/// One timer session: the engine, its collaborators, and the display state.
struct Session {
    engine: IntervalTimerEngine,
    runner: CommandRunner<TerminalCuePlayer, Box<dyn KeepAwake>>,
    pulse: BreakPulse,
    last_cue: Option<Cue>,
    started: bool,
    json: bool,
}

impl Session {
    fn new(
        engine: IntervalTimerEngine,
        runner: CommandRunner<TerminalCuePlayer, Box<dyn KeepAwake>>,
        json: bool,
    ) -> Self {
        Self {
            engine,
            runner,
            pulse: BreakPulse::new(),
            last_cue: None,
            started: false,
            json,
        }
    }

    /// Run commands through the runner; hand trigger commands back to the
    /// event loop, which owns the interval sources.
    fn dispatch(&mut self, commands: Vec<Command>) -> Vec<Command> {
        let mut triggers = Vec::new();
        for command in commands {
            if let Command::PlayCue { cue } = command {
                self.last_cue = Some(cue);
            }
            if let Some(trigger) = self.runner.apply(command) {
                if trigger == Command::StopBreakPulse {
                    self.pulse.reset();
                }
                triggers.push(trigger);
            }
        }
        triggers
    }

    fn on_clock(&mut self) -> Vec<Command> {
        let Some(outcome) = self.engine.tick() else {
            // Clock callback raced a pause; the engine ignored it.
            return Vec::new();
        };
        let triggers = self.dispatch(outcome.commands);
        if self.json {
            if let Some(phase) = outcome.phase_changed {
                self.emit(&Event::phase_changed(phase, outcome.snapshot.remaining_secs));
            }
            self.emit(&self.engine.snapshot_event());
        } else {
            self.render();
        }
        triggers
    }

    fn show_initial_state(&self) {
        if self.json {
            self.emit(&self.engine.snapshot_event());
        } else {
            self.render();
        }
    }

    fn on_pulse(&mut self) {
        self.pulse.toggle();
        if !self.json {
            self.render();
        }
    }

    fn on_input(&mut self, line: &str) -> (bool, Vec<Command>) {
        match line {
            "q" => (false, Vec::new()),
            "r" => {
                let commands = self.engine.reset();
                let triggers = self.dispatch(commands);
                self.last_cue = None;
                if self.json {
                    self.emit(&Event::timer_reset());
                } else {
                    self.render();
                }
                (true, triggers)
            }
            "" => (true, self.toggle_running()),
            _ => (true, Vec::new()),
        }
    }

    fn toggle_running(&mut self) -> Vec<Command> {
        let running = !self.engine.is_running();
        let commands = self.engine.set_running(running);
        let triggers = self.dispatch(commands);
        if self.json {
            let remaining = self.engine.remaining_secs();
            let event = if running && !self.started {
                Event::timer_started(self.engine.config().active_secs)
            } else if running {
                Event::timer_resumed(remaining)
            } else {
                Event::timer_paused(remaining)
            };
            self.emit(&event);
        } else {
            self.render();
        }
        if running {
            self.started = true;
        }
        triggers
    }

    fn shutdown(&mut self) {
        let commands = self.engine.teardown();
        self.dispatch(commands);
        if !self.json {
            println!();
        }
    }

    fn emit(&self, event: &Event) {
        if let Ok(json) = serde_json::to_string(event) {
            println!("{json}");
        }
    }

    /// Redraw the single status line: arc-style progress bar, remaining
    /// seconds, phase, last cue glyph.
    fn render(&self) {
        const BAR_WIDTH: usize = 20;
        let snap = self.engine.snapshot();
        let filled = (snap.progress * BAR_WIDTH as f64).round() as usize;
        let filled = filled.min(BAR_WIDTH);
        let bar: String = "\u{2588}".repeat(filled) + &"\u{2591}".repeat(BAR_WIDTH - filled);

        let digits_color = match (snap.phase, self.pulse.color()) {
            (Phase::Break, PulseColor::Alternate) => "\x1b[90m",
            (Phase::Break, PulseColor::Primary) => "\x1b[97m",
            _ => "\x1b[0m",
        };
        let phase_label = match snap.phase {
            Phase::Active => "active",
            Phase::Break => "break",
        };
        let cue_glyph = match self.last_cue {
            Some(Cue::Tick) => "\u{00b7}",
            Some(Cue::Tock) => "\u{2022}",
            Some(Cue::Bell) => "\u{25ce}",
            Some(Cue::Heartbeat) => "\u{2665}",
            None => " ",
        };
        let state = if snap.running { "" } else { "  [paused]" };

        let mut out = std::io::stdout().lock();
        let _ = write!(
            out,
            "\r\x1b[2K[{bar}] {digits_color}{remaining:>4}s\x1b[0m {phase_label} {cue_glyph}{state}",
            remaining = snap.remaining_secs,
        );
        let _ = out.flush();
    }
}
