//! Relay link: transport bytes → gate → decoder → mailbox → AppService.

use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;

use tankpump::adapters::config_store::ConfigStore;
use tankpump::adapters::nvs::NvsStorage;
use tankpump::adapters::time::SimClock;
use tankpump::app::commands::AppCommand;
use tankpump::app::service::AppService;
use tankpump::config::{PumpConfig, SettingsPatch};
use tankpump::relay::gate::{BURST, CommandGate};
use tankpump::relay::link::RelayLink;
use tankpump::relay::mailbox::{CommandMailbox, DEPTH};

use super::mock_hw::{MockHardware, RecordingSink, ScriptedTransport};

fn frozen() -> Duration {
    Duration::ZERO
}

/// Jumps a minute per call, so the bucket is always refilled.
fn racing() -> Duration {
    static T: AtomicU64 = AtomicU64::new(0);
    Duration::from_secs(T.fetch_add(60, Ordering::Relaxed))
}

fn link(gate: CommandGate) -> RelayLink<ScriptedTransport> {
    RelayLink::with_gate(ScriptedTransport::new(), gate)
}

#[test]
fn frames_land_in_mailbox_in_order() {
    let mut link = link(CommandGate::with_clock(racing));
    let mailbox = CommandMailbox::new();
    link.transport_mut()
        .push(b"{\"command\":\"PUMP_ON\"}\n{\"command\":\"AUTO\"}\r\n");

    assert_eq!(link.poll(&mailbox), 2);
    assert_eq!(mailbox.take(), Some(AppCommand::PumpOn));
    assert_eq!(mailbox.take(), Some(AppCommand::Auto));
    assert!(mailbox.is_empty());
    assert_eq!(link.stats().accepted, 2);
}

#[test]
fn frame_split_across_reads() {
    let mut link = link(CommandGate::with_clock(racing));
    let mailbox = CommandMailbox::new();

    link.transport_mut().push(b"{\"command\":\"SET");
    assert_eq!(link.poll(&mailbox), 0);

    link.transport_mut().push(b"TINGS\",\"max\":80}\n");
    assert_eq!(link.poll(&mailbox), 1);
    assert_eq!(
        mailbox.take(),
        Some(AppCommand::Settings(SettingsPatch {
            pump_off_level: Some(80),
            ..SettingsPatch::default()
        }))
    );
}

#[test]
fn bad_frames_are_counted_and_dropped() {
    let mut link = link(CommandGate::with_clock(racing));
    let mailbox = CommandMailbox::new();
    link.transport_mut().push(
        b"not json\n{\"min\":10}\n{\"command\":\"REBOOT\"}\n{\"command\":\"PUMP_OFF\"}\n",
    );

    assert_eq!(link.poll(&mailbox), 1);
    assert_eq!(link.stats().undecodable, 3);
    assert_eq!(mailbox.take(), Some(AppCommand::PumpOff));
}

#[test]
fn flood_is_rate_limited() {
    let mut link = link(CommandGate::with_clock(frozen));
    let mailbox = CommandMailbox::new();
    for _ in 0..BURST + 2 {
        link.transport_mut().push(b"{\"command\":\"AUTO\"}\n");
    }

    assert_eq!(link.poll(&mailbox), BURST as usize);
    assert_eq!(link.stats().rate_limited, 2);
    assert_eq!(mailbox.len(), BURST as usize);
}

#[test]
fn full_mailbox_drops_excess() {
    let mut link = link(CommandGate::with_clock(racing));
    let mailbox = CommandMailbox::new();
    let frame = b"{\"command\":\"AUTO\"}\n";
    // One read per frame; a single poll stops after eight reads.
    for _ in 0..DEPTH + 2 {
        link.transport_mut().push(frame);
    }

    let mut posted = 0;
    while !link.transport().inbound.is_empty() {
        posted += link.poll(&mailbox);
    }
    assert_eq!(posted, DEPTH);
    assert_eq!(link.stats().mailbox_full, 2);
}

#[test]
fn status_goes_out_as_one_line() {
    let mut link = link(CommandGate::with_clock(racing));
    let app = AppService::new(PumpConfig::default());

    link.send_status(&app.status()).unwrap();
    link.send_status(&app.status()).unwrap();

    let lines = link.transport().written_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("{\"level\":0,\"pump\":false,"));
    assert!(lines[0].contains("\"mode\":\"AUTO\""));
    assert!(lines[0].ends_with("\"h_cm\":100}}"));
}

#[test]
fn relay_commands_drive_the_app() {
    let mut link = link(CommandGate::with_clock(racing));
    let mailbox = CommandMailbox::new();
    let mut app = AppService::new(PumpConfig::default());
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    let mut store = ConfigStore::new(NvsStorage::new().unwrap());
    let clock = SimClock::new(None);

    link.transport_mut().push(b"{\"command\":\"PUMP_ON\"}\n");
    link.poll(&mailbox);
    for cmd in mailbox.drain() {
        app.handle_command(cmd, &mut hw, &mut store, &mut sink);
    }
    hw.set_fill(95.0);
    let status = app.tick(&mut hw, &clock, &mut sink);
    link.send_status(&status).unwrap();

    assert!(hw.relay_on());
    let line = &link.transport().written_lines()[0];
    assert!(line.contains("\"pump\":true"));
    assert!(line.contains("\"mode\":\"MANUAL\""));
    assert!(line.contains("\"level\":95"));
}
