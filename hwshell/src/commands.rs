//! Command table and handlers
//!
//! The single static table drives dispatch, tab-completion, and the help
//! listing. Universal commands carry [`Block::Any`]; block-entry commands
//! carry their target block plus the `entry` flag so they stay visible from
//! everywhere. Handlers pull missing arguments through the session's
//! interactive prompts, so `power` and `power 3 on` both work.

use std::path::Path;

use cmd_registry::{CommandDef, Lookup, Registry};
use shell_types::{Block, CommandFailure, CommandResult};

use crate::backend::{BackendError, HotSwapState, ManagedSystem, Severity};
use crate::session::{EventDisplay, ShellSession};

/// Fresh registry view over the static table.
pub fn registry() -> Registry<ShellSession> {
    Registry::new(COMMANDS)
}

/// The block-filtered command listing, four names per row.
pub(crate) fn print_available(session: &mut ShellSession, registry: &Registry<ShellSession>) {
    let names = registry.visible_names(session.block);
    let mut listing = String::from("Available commands are: \n");
    for (i, name) in names.iter().enumerate() {
        listing.push_str(&format!("{:<20}", name));
        if (i + 1) % 4 == 0 {
            listing.push('\n');
        }
    }
    session.println(listing.trim_end_matches(' '));
}

pub static COMMANDS: &[CommandDef<ShellSession>] = &[
    // Universal
    CommandDef {
        name: "help",
        block: Block::Any,
        entry: false,
        run: cmd_help,
        help: "help [command ...] - show available commands or command help",
    },
    CommandDef {
        name: "?",
        block: Block::Any,
        entry: false,
        run: cmd_help,
        help: "? [command ...] - same as help",
    },
    CommandDef {
        name: "history",
        block: Block::Any,
        entry: false,
        run: cmd_history,
        help: "history - numbered list of entered commands",
    },
    CommandDef {
        name: "echo",
        block: Block::Any,
        entry: false,
        run: cmd_echo,
        help: "echo [text ...] - print the arguments",
    },
    CommandDef {
        name: "ver",
        block: Block::Any,
        entry: false,
        run: cmd_ver,
        help: "ver - show version",
    },
    CommandDef {
        name: "event",
        block: Block::Any,
        entry: false,
        run: cmd_event,
        help: "event [enable|disable|short|full] - set event display mode",
    },
    CommandDef {
        name: "debug",
        block: Block::Any,
        entry: false,
        run: cmd_debug,
        help: "debug [on|off] - set debug tracing",
    },
    CommandDef {
        name: "more",
        block: Block::Any,
        entry: false,
        run: cmd_more,
        help: "more [on|off] - set output paging",
    },
    CommandDef {
        name: "run",
        block: Block::Any,
        entry: false,
        run: cmd_run,
        help: "run <file> - execute commands from a file",
    },
    CommandDef {
        name: "quit",
        block: Block::Any,
        entry: false,
        run: cmd_quit,
        help: "quit - leave the current block, or the shell from the main block",
    },
    CommandDef {
        name: "q",
        block: Block::Any,
        entry: false,
        run: cmd_quit,
        help: "q - same as quit",
    },
    // Main block
    CommandDef {
        name: "dscv",
        block: Block::Main,
        entry: false,
        run: cmd_dscv,
        help: "dscv - discover managed resources",
    },
    CommandDef {
        name: "lsres",
        block: Block::Main,
        entry: false,
        run: cmd_lsres,
        help: "lsres - list managed resources",
    },
    CommandDef {
        name: "rpt",
        block: Block::Main,
        entry: false,
        run: cmd_rpt,
        help: "rpt <res_id> - show resource details",
    },
    CommandDef {
        name: "showrpt",
        block: Block::Main,
        entry: false,
        run: cmd_rpt,
        help: "showrpt <res_id> - same as rpt",
    },
    CommandDef {
        name: "rdr",
        block: Block::Main,
        entry: false,
        run: cmd_rdr,
        help: "rdr <res_id> - list the resource's instruments",
    },
    CommandDef {
        name: "showrdr",
        block: Block::Main,
        entry: false,
        run: cmd_rdr,
        help: "showrdr <res_id> - same as rdr",
    },
    CommandDef {
        name: "power",
        block: Block::Main,
        entry: false,
        run: cmd_power,
        help: "power <res_id> <on|off|cycle> - set resource power state",
    },
    CommandDef {
        name: "reset",
        block: Block::Main,
        entry: false,
        run: cmd_reset,
        help: "reset <res_id> <cold|warm> - reset a resource",
    },
    CommandDef {
        name: "settag",
        block: Block::Main,
        entry: false,
        run: cmd_settag,
        help: "settag <res_id> <tag> - set resource tag",
    },
    CommandDef {
        name: "setsever",
        block: Block::Main,
        entry: false,
        run: cmd_setsever,
        help: "setsever <res_id> <critical|major|minor|ok|info> - set resource severity",
    },
    // Block entries
    CommandDef {
        name: "sen",
        block: Block::Sensor,
        entry: true,
        run: enter_sensor,
        help: "sen [res_id [num]] - enter the sensor block",
    },
    CommandDef {
        name: "ctrl",
        block: Block::Control,
        entry: true,
        run: enter_control,
        help: "ctrl [res_id [num]] - enter the control block",
    },
    CommandDef {
        name: "inv",
        block: Block::Inventory,
        entry: true,
        run: enter_inventory,
        help: "inv [res_id] - enter the inventory block",
    },
    CommandDef {
        name: "ann",
        block: Block::Annunciator,
        entry: true,
        run: enter_annunciator,
        help: "ann [res_id] - enter the annunciator block",
    },
    CommandDef {
        name: "hs",
        block: Block::HotSwap,
        entry: true,
        run: enter_hot_swap,
        help: "hs [res_id] - enter the hot swap block",
    },
    CommandDef {
        name: "diag",
        block: Block::Diag,
        entry: true,
        run: enter_diag,
        help: "diag [res_id] - enter the diagnostics block",
    },
    CommandDef {
        name: "fw",
        block: Block::Firmware,
        entry: true,
        run: enter_firmware,
        help: "fw [res_id] - enter the firmware block",
    },
    // Sensor block
    CommandDef {
        name: "show",
        block: Block::Sensor,
        entry: false,
        run: sensor_show,
        help: "show - show the selected sensor",
    },
    CommandDef {
        name: "enable",
        block: Block::Sensor,
        entry: false,
        run: sensor_enable,
        help: "enable - enable the selected sensor",
    },
    CommandDef {
        name: "disable",
        block: Block::Sensor,
        entry: false,
        run: sensor_disable,
        help: "disable - disable the selected sensor",
    },
    CommandDef {
        name: "evtenb",
        block: Block::Sensor,
        entry: false,
        run: sensor_evtenb,
        help: "evtenb - enable sensor events",
    },
    CommandDef {
        name: "evtdis",
        block: Block::Sensor,
        entry: false,
        run: sensor_evtdis,
        help: "evtdis - disable sensor events",
    },
    CommandDef {
        name: "setthres",
        block: Block::Sensor,
        entry: false,
        run: sensor_setthres,
        help: "setthres [low high] - set sensor thresholds",
    },
    // Control block
    CommandDef {
        name: "show",
        block: Block::Control,
        entry: false,
        run: control_show,
        help: "show - show the selected control",
    },
    CommandDef {
        name: "state",
        block: Block::Control,
        entry: false,
        run: control_state,
        help: "state - show the control state",
    },
    CommandDef {
        name: "setstate",
        block: Block::Control,
        entry: false,
        run: control_setstate,
        help: "setstate <value> - set the control state",
    },
    // Inventory block
    CommandDef {
        name: "show",
        block: Block::Inventory,
        entry: false,
        run: inventory_show,
        help: "show - show the inventory areas",
    },
    CommandDef {
        name: "addarea",
        block: Block::Inventory,
        entry: false,
        run: inventory_addarea,
        help: "addarea <kind> - add an inventory area",
    },
    CommandDef {
        name: "delarea",
        block: Block::Inventory,
        entry: false,
        run: inventory_delarea,
        help: "delarea <area_id> - delete an inventory area",
    },
    CommandDef {
        name: "setfield",
        block: Block::Inventory,
        entry: false,
        run: inventory_setfield,
        help: "setfield <area_id> <name> <value> - set an inventory field",
    },
    // Annunciator block
    CommandDef {
        name: "list",
        block: Block::Annunciator,
        entry: false,
        run: annunciator_list,
        help: "list - list announcements",
    },
    CommandDef {
        name: "add",
        block: Block::Annunciator,
        entry: false,
        run: annunciator_add,
        help: "add <severity> <text> - add an announcement",
    },
    CommandDef {
        name: "delete",
        block: Block::Annunciator,
        entry: false,
        run: annunciator_delete,
        help: "delete <id> - delete an announcement",
    },
    CommandDef {
        name: "acknow",
        block: Block::Annunciator,
        entry: false,
        run: annunciator_acknow,
        help: "acknow [id] - acknowledge one or all announcements",
    },
    CommandDef {
        name: "show",
        block: Block::Annunciator,
        entry: false,
        run: annunciator_show,
        help: "show <id> - show one announcement",
    },
    // Hot swap block
    CommandDef {
        name: "state",
        block: Block::HotSwap,
        entry: false,
        run: hot_swap_state,
        help: "state - show the hot swap state",
    },
    CommandDef {
        name: "active",
        block: Block::HotSwap,
        entry: false,
        run: hot_swap_active,
        help: "active - set the resource active",
    },
    CommandDef {
        name: "inactive",
        block: Block::HotSwap,
        entry: false,
        run: hot_swap_inactive,
        help: "inactive - set the resource inactive",
    },
    CommandDef {
        name: "action",
        block: Block::HotSwap,
        entry: false,
        run: hot_swap_action,
        help: "action <insert|extract> - request a hot swap action",
    },
    CommandDef {
        name: "policycancel",
        block: Block::HotSwap,
        entry: false,
        run: hot_swap_policycancel,
        help: "policycancel - cancel the automatic hot swap policy",
    },
    // Diagnostics block
    CommandDef {
        name: "ls",
        block: Block::Diag,
        entry: false,
        run: diag_ls,
        help: "ls - list diagnostic tests",
    },
    CommandDef {
        name: "start",
        block: Block::Diag,
        entry: false,
        run: diag_start,
        help: "start <test> - run a diagnostic test",
    },
    CommandDef {
        name: "status",
        block: Block::Diag,
        entry: false,
        run: diag_status,
        help: "status <test> - show a diagnostic test status",
    },
    // Firmware block
    CommandDef {
        name: "banks",
        block: Block::Firmware,
        entry: false,
        run: firmware_banks,
        help: "banks - list firmware banks",
    },
    CommandDef {
        name: "start",
        block: Block::Firmware,
        entry: false,
        run: firmware_start,
        help: "start <bank_id> - start an upgrade on a bank",
    },
    CommandDef {
        name: "status",
        block: Block::Firmware,
        entry: false,
        run: firmware_status,
        help: "status - show upgrade status of all banks",
    },
];

// ---- universal commands ----------------------------------------------

fn cmd_help(s: &mut ShellSession) -> CommandResult {
    let registry = registry();
    let mut args = Vec::new();
    while let Some(arg) = s.next_arg() {
        args.push(arg);
    }
    if args.is_empty() {
        print_available(s, &registry);
        return Ok(());
    }
    for arg in args {
        match registry.lookup(&arg, s.block) {
            Lookup::Found(def) => {
                let help = def.help;
                s.println(help);
            }
            _ => {
                let msg = format!("Invalid help command {}", arg);
                s.println(&msg);
            }
        }
    }
    Ok(())
}

fn cmd_history(s: &mut ShellSession) -> CommandResult {
    let lines: Vec<String> = s
        .history
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{:3}  {}", i, entry))
        .collect();
    for line in lines {
        if !s.println(&line) {
            break;
        }
    }
    Ok(())
}

fn cmd_echo(s: &mut ShellSession) -> CommandResult {
    let mut parts = Vec::new();
    while let Some(arg) = s.next_arg() {
        parts.push(arg);
    }
    let line = parts.join(" ");
    s.println(&line);
    Ok(())
}

fn cmd_ver(s: &mut ShellSession) -> CommandResult {
    let mut line = format!("hwshell version {}", env!("CARGO_PKG_VERSION"));
    if let Some(host) = &s.host {
        line.push_str(&format!(", host {}", host));
    }
    s.println(&line);
    Ok(())
}

fn cmd_event(s: &mut ShellSession) -> CommandResult {
    match s.next_arg().as_deref() {
        None => {}
        Some("enable") | Some("full") => s.event_display = EventDisplay::Full,
        Some("short") => s.event_display = EventDisplay::Short,
        Some("disable") => s.event_display = EventDisplay::Off,
        Some(other) => {
            let msg = format!("Invalid event display mode: {}", other);
            s.println(&msg);
            return Err(CommandFailure::Params);
        }
    }
    let state = match s.event_display {
        EventDisplay::Off => "off",
        EventDisplay::Short => "short",
        EventDisplay::Full => "full",
    };
    let msg = format!("event display: {}", state);
    s.println(&msg);
    Ok(())
}

fn cmd_debug(s: &mut ShellSession) -> CommandResult {
    match s.next_arg().as_deref() {
        None => {}
        Some("on") => s.log.set_echo(true),
        Some("off") => s.log.set_echo(false),
        Some(other) => {
            let msg = format!("Invalid debug mode: {}", other);
            s.println(&msg);
            return Err(CommandFailure::Params);
        }
    }
    let msg = format!("debug: {}", if s.log.echo() { "on" } else { "off" });
    s.println(&msg);
    Ok(())
}

fn cmd_more(s: &mut ShellSession) -> CommandResult {
    match s.next_arg().as_deref() {
        None => {}
        Some("on") => s.pager.enabled = true,
        Some("off") => s.pager.enabled = false,
        Some(other) => {
            let msg = format!("Invalid more mode: {}", other);
            s.println(&msg);
            return Err(CommandFailure::Params);
        }
    }
    let msg = format!("more: {}", if s.pager.enabled { "on" } else { "off" });
    s.println(&msg);
    Ok(())
}

fn cmd_run(s: &mut ShellSession) -> CommandResult {
    let path = s.ask_string("File name: ")?;
    if let Err(msg) = s.run_script(Path::new(&path)) {
        s.println(&msg);
        return Err(CommandFailure::Command);
    }
    Ok(())
}

fn cmd_quit(s: &mut ShellSession) -> CommandResult {
    if s.block.is_main() {
        s.exit_requested = true;
    } else {
        s.block = Block::Main;
        s.block_env.clear();
    }
    Ok(())
}

// ---- main block -------------------------------------------------------

fn cmd_dscv(s: &mut ShellSession) -> CommandResult {
    let count = s.system.discover();
    s.log.debug("discovery completed");
    let msg = format!("Discovery done: {} resources", count);
    s.println(&msg);
    Ok(())
}

fn cmd_lsres(s: &mut ShellSession) -> CommandResult {
    let lines: Vec<String> = s
        .system
        .resources()
        .iter()
        .map(|r| {
            format!(
                "Resource {}: \"{}\"  severity {}  power {}  hs {}",
                r.id,
                r.tag,
                r.severity,
                if r.powered { "on" } else { "off" },
                r.hot_swap
            )
        })
        .collect();
    for line in lines {
        if !s.println(&line) {
            break;
        }
    }
    Ok(())
}

fn cmd_rpt(s: &mut ShellSession) -> CommandResult {
    let id = s.ask_int("Resource id: ")?;
    let text = match s.system.resource(id) {
        Ok(r) => format!(
            "Resource {}:\n  tag: \"{}\"\n  severity: {}\n  power: {}\n  hot swap: {}\n  \
             sensors: {}  controls: {}  inventory areas: {}",
            r.id,
            r.tag,
            r.severity,
            if r.powered { "on" } else { "off" },
            r.hot_swap,
            r.sensors.len(),
            r.controls.len(),
            r.inventory.len()
        ),
        Err(e) => return Err(s.fail(e)),
    };
    s.println(&text);
    Ok(())
}

fn cmd_rdr(s: &mut ShellSession) -> CommandResult {
    let id = s.ask_int("Resource id: ")?;
    let lines = match s.system.resource(id) {
        Ok(r) => {
            let mut lines = Vec::new();
            for sensor in &r.sensors {
                lines.push(format!("  sensor {}: {}", sensor.num, sensor.name));
            }
            for control in &r.controls {
                lines.push(format!("  control {}: {}", control.num, control.name));
            }
            for area in &r.inventory {
                lines.push(format!("  inventory area {}: {}", area.id, area.kind));
            }
            for ann in &r.announcements {
                lines.push(format!("  announcement {}: {}", ann.id, ann.text));
            }
            lines
        }
        Err(e) => return Err(s.fail(e)),
    };
    let header = format!("Instruments of resource {}:", id);
    s.println(&header);
    for line in lines {
        if !s.println(&line) {
            break;
        }
    }
    Ok(())
}

fn cmd_power(s: &mut ShellSession) -> CommandResult {
    let id = s.ask_int("Resource id: ")?;
    let action = s.ask_string("Power state (on|off|cycle): ")?;
    let result = match action.as_str() {
        "on" => s.system.set_power(id, true),
        "off" => s.system.set_power(id, false),
        "cycle" => s
            .system
            .set_power(id, false)
            .and_then(|_| s.system.set_power(id, true)),
        _ => {
            let msg = format!("Invalid action: {}", action);
            s.println(&msg);
            return Err(CommandFailure::Params);
        }
    };
    result.map_err(|e| s.fail(e))
}

fn cmd_reset(s: &mut ShellSession) -> CommandResult {
    let id = s.ask_int("Resource id: ")?;
    let kind = s.ask_string("Reset type (cold|warm): ")?;
    let cold = match kind.as_str() {
        "cold" => true,
        "warm" => false,
        _ => {
            let msg = format!("Invalid action: {}", kind);
            s.println(&msg);
            return Err(CommandFailure::Params);
        }
    };
    s.system.reset(id, cold).map_err(|e| s.fail(e))
}

fn cmd_settag(s: &mut ShellSession) -> CommandResult {
    let id = s.ask_int("Resource id: ")?;
    let tag = s.ask_string("New tag: ")?;
    s.system.set_tag(id, &tag).map_err(|e| s.fail(e))
}

fn cmd_setsever(s: &mut ShellSession) -> CommandResult {
    let id = s.ask_int("Resource id: ")?;
    let text = s.ask_string("Severity (critical|major|minor|ok|info): ")?;
    let Some(severity) = Severity::parse(&text) else {
        let msg = format!("Invalid severity: {}", text);
        s.println(&msg);
        return Err(CommandFailure::Params);
    };
    s.system.set_severity(id, severity).map_err(|e| s.fail(e))
}

// ---- block entry ------------------------------------------------------

fn enter_sensor(s: &mut ShellSession) -> CommandResult {
    let resource = s.ask_int("Resource id: ")?;
    let instrument = s.ask_int("Sensor num: ")?;
    let found = match s.system.resource(resource) {
        Ok(r) => r.sensors.iter().any(|x| x.num == instrument),
        Err(e) => return Err(s.fail(e)),
    };
    if !found {
        return Err(s.fail(BackendError::NoInstrument {
            resource,
            instrument,
        }));
    }
    s.block_env.resource = Some(resource);
    s.block_env.instrument = Some(instrument);
    Ok(())
}

fn enter_control(s: &mut ShellSession) -> CommandResult {
    let resource = s.ask_int("Resource id: ")?;
    let instrument = s.ask_int("Control num: ")?;
    let found = match s.system.resource(resource) {
        Ok(r) => r.controls.iter().any(|x| x.num == instrument),
        Err(e) => return Err(s.fail(e)),
    };
    if !found {
        return Err(s.fail(BackendError::NoInstrument {
            resource,
            instrument,
        }));
    }
    s.block_env.resource = Some(resource);
    s.block_env.instrument = Some(instrument);
    Ok(())
}

fn select_resource(s: &mut ShellSession) -> CommandResult {
    let resource = s.ask_int("Resource id: ")?;
    if let Err(e) = s.system.resource(resource) {
        return Err(s.fail(e));
    }
    s.block_env.resource = Some(resource);
    s.block_env.instrument = None;
    Ok(())
}

fn enter_inventory(s: &mut ShellSession) -> CommandResult {
    select_resource(s)
}

fn enter_annunciator(s: &mut ShellSession) -> CommandResult {
    select_resource(s)
}

fn enter_hot_swap(s: &mut ShellSession) -> CommandResult {
    select_resource(s)
}

fn enter_diag(s: &mut ShellSession) -> CommandResult {
    select_resource(s)
}

fn enter_firmware(s: &mut ShellSession) -> CommandResult {
    select_resource(s)
}

// ---- sensor block -----------------------------------------------------

fn sensor_show(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let instrument = s.env_instrument()?;
    let text = match s.system.resource(resource) {
        Ok(r) => match r.sensors.iter().find(|x| x.num == instrument) {
            Some(sensor) => format!(
                "Sensor {}: {}\n  reading: {} {}\n  state: {}  events: {}\n  \
                 thresholds: low {} high {}",
                sensor.num,
                sensor.name,
                sensor.reading,
                sensor.unit,
                if sensor.enabled { "enabled" } else { "disabled" },
                if sensor.events_enabled {
                    "enabled"
                } else {
                    "disabled"
                },
                sensor.threshold_low,
                sensor.threshold_high
            ),
            None => {
                return Err(s.fail(BackendError::NoInstrument {
                    resource,
                    instrument,
                }))
            }
        },
        Err(e) => return Err(s.fail(e)),
    };
    s.println(&text);
    Ok(())
}

fn sensor_set_enabled(s: &mut ShellSession, enabled: bool) -> CommandResult {
    let resource = s.env_resource()?;
    let instrument = s.env_instrument()?;
    match s.system.sensor_mut(resource, instrument) {
        Ok(sensor) => sensor.enabled = enabled,
        Err(e) => return Err(s.fail(e)),
    }
    let msg = format!(
        "sensor {}: {}",
        instrument,
        if enabled { "enabled" } else { "disabled" }
    );
    s.println(&msg);
    Ok(())
}

fn sensor_enable(s: &mut ShellSession) -> CommandResult {
    sensor_set_enabled(s, true)
}

fn sensor_disable(s: &mut ShellSession) -> CommandResult {
    sensor_set_enabled(s, false)
}

fn sensor_set_events(s: &mut ShellSession, enabled: bool) -> CommandResult {
    let resource = s.env_resource()?;
    let instrument = s.env_instrument()?;
    match s.system.sensor_mut(resource, instrument) {
        Ok(sensor) => sensor.events_enabled = enabled,
        Err(e) => return Err(s.fail(e)),
    }
    let msg = format!(
        "sensor {} events: {}",
        instrument,
        if enabled { "enabled" } else { "disabled" }
    );
    s.println(&msg);
    Ok(())
}

fn sensor_evtenb(s: &mut ShellSession) -> CommandResult {
    sensor_set_events(s, true)
}

fn sensor_evtdis(s: &mut ShellSession) -> CommandResult {
    sensor_set_events(s, false)
}

fn sensor_setthres(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let instrument = s.env_instrument()?;
    let low = s.ask_float("Lower threshold: ")?;
    let high = s.ask_float("Upper threshold: ")?;
    if low > high {
        let msg = format!("Invalid thresholds: low {} above high {}", low, high);
        s.println(&msg);
        return Err(CommandFailure::Params);
    }
    match s.system.sensor_mut(resource, instrument) {
        Ok(sensor) => {
            sensor.threshold_low = low;
            sensor.threshold_high = high;
        }
        Err(e) => return Err(s.fail(e)),
    }
    let msg = format!("sensor {} thresholds: low {} high {}", instrument, low, high);
    s.println(&msg);
    Ok(())
}

// ---- control block ----------------------------------------------------

fn control_show(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let instrument = s.env_instrument()?;
    let text = match s.system.resource(resource) {
        Ok(r) => match r.controls.iter().find(|x| x.num == instrument) {
            Some(control) => format!(
                "Control {}: {}\n  state: {}",
                control.num, control.name, control.state
            ),
            None => {
                return Err(s.fail(BackendError::NoInstrument {
                    resource,
                    instrument,
                }))
            }
        },
        Err(e) => return Err(s.fail(e)),
    };
    s.println(&text);
    Ok(())
}

fn control_state(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let instrument = s.env_instrument()?;
    let text = match s.system.resource(resource) {
        Ok(r) => match r.controls.iter().find(|x| x.num == instrument) {
            Some(control) => format!("state: {}", control.state),
            None => {
                return Err(s.fail(BackendError::NoInstrument {
                    resource,
                    instrument,
                }))
            }
        },
        Err(e) => return Err(s.fail(e)),
    };
    s.println(&text);
    Ok(())
}

fn control_setstate(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let instrument = s.env_instrument()?;
    let value = s.ask_string("State: ")?;
    match s.system.control_mut(resource, instrument) {
        Ok(control) => control.state = value.clone(),
        Err(e) => return Err(s.fail(e)),
    }
    let msg = format!("state set to {}", value);
    s.println(&msg);
    Ok(())
}

// ---- inventory block --------------------------------------------------

fn inventory_show(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let lines = match s.system.resource(resource) {
        Ok(r) => {
            let mut lines = Vec::new();
            for area in &r.inventory {
                lines.push(format!("Area {} ({})", area.id, area.kind));
                for (name, value) in &area.fields {
                    lines.push(format!("  {}: {}", name, value));
                }
            }
            lines
        }
        Err(e) => return Err(s.fail(e)),
    };
    for line in lines {
        if !s.println(&line) {
            break;
        }
    }
    Ok(())
}

fn inventory_addarea(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let kind = s.ask_string("Area kind: ")?;
    match s.system.add_area(resource, &kind) {
        Ok(area) => {
            let msg = format!("area {} added", area);
            s.println(&msg);
            Ok(())
        }
        Err(e) => Err(s.fail(e)),
    }
}

fn inventory_delarea(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let area = s.ask_int("Area id: ")?;
    s.system.delete_area(resource, area).map_err(|e| s.fail(e))
}

fn inventory_setfield(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let area = s.ask_int("Area id: ")?;
    let name = s.ask_string("Field name: ")?;
    let value = s.ask_string("Field value: ")?;
    s.system
        .set_field(resource, area, &name, &value)
        .map_err(|e| s.fail(e))
}

// ---- annunciator block ------------------------------------------------

fn annunciator_list(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let lines = match s.system.resource(resource) {
        Ok(r) => r
            .announcements
            .iter()
            .map(|a| {
                format!(
                    "{:3}  {}  {}{}",
                    a.id,
                    a.severity,
                    a.text,
                    if a.acknowledged { "  (acknowledged)" } else { "" }
                )
            })
            .collect::<Vec<_>>(),
        Err(e) => return Err(s.fail(e)),
    };
    for line in lines {
        if !s.println(&line) {
            break;
        }
    }
    Ok(())
}

fn annunciator_add(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let text = s.ask_string("Severity (critical|major|minor|ok|info): ")?;
    let Some(severity) = Severity::parse(&text) else {
        let msg = format!("Invalid severity: {}", text);
        s.println(&msg);
        return Err(CommandFailure::Params);
    };
    let message = s.ask_string("Text: ")?;
    match s.system.add_announcement(resource, severity, &message) {
        Ok(id) => {
            let msg = format!("announcement {} added", id);
            s.println(&msg);
            Ok(())
        }
        Err(e) => Err(s.fail(e)),
    }
}

fn annunciator_delete(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let id = s.ask_int("Announcement id: ")?;
    s.system
        .delete_announcement(resource, id)
        .map_err(|e| s.fail(e))
}

fn annunciator_acknow(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let target = match s.next_arg() {
        Some(text) => Some(crate::session::parse_u32(&text).ok_or(CommandFailure::Params)?),
        None => None,
    };
    s.system
        .acknowledge(resource, target)
        .map_err(|e| s.fail(e))
}

fn annunciator_show(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let id = s.ask_int("Announcement id: ")?;
    let text = match s.system.resource(resource) {
        Ok(r) => match r.announcements.iter().find(|a| a.id == id) {
            Some(a) => format!(
                "Announcement {}:\n  severity: {}\n  text: {}\n  acknowledged: {}",
                a.id, a.severity, a.text, a.acknowledged
            ),
            None => return Err(s.fail(BackendError::NoAnnouncement { resource, id })),
        },
        Err(e) => return Err(s.fail(e)),
    };
    s.println(&text);
    Ok(())
}

// ---- hot swap block ---------------------------------------------------

fn hot_swap_state(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let text = match s.system.resource(resource) {
        Ok(r) => format!("hot swap state: {}", r.hot_swap),
        Err(e) => return Err(s.fail(e)),
    };
    s.println(&text);
    Ok(())
}

fn hot_swap_set(s: &mut ShellSession, state: HotSwapState) -> CommandResult {
    let resource = s.env_resource()?;
    if let Err(e) = s.system.set_hot_swap(resource, state) {
        return Err(s.fail(e));
    }
    let msg = format!("hot swap state: {}", state);
    s.println(&msg);
    Ok(())
}

fn hot_swap_active(s: &mut ShellSession) -> CommandResult {
    hot_swap_set(s, HotSwapState::Active)
}

fn hot_swap_inactive(s: &mut ShellSession) -> CommandResult {
    hot_swap_set(s, HotSwapState::Inactive)
}

fn hot_swap_action(s: &mut ShellSession) -> CommandResult {
    let action = s.ask_string("Action (insert|extract): ")?;
    let state = match action.as_str() {
        "insert" => HotSwapState::InsertionPending,
        "extract" => HotSwapState::ExtractionPending,
        _ => {
            let msg = format!("Invalid action: {}", action);
            s.println(&msg);
            return Err(CommandFailure::Params);
        }
    };
    hot_swap_set(s, state)
}

fn hot_swap_policycancel(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    if let Err(e) = s.system.resource(resource) {
        return Err(s.fail(e));
    }
    let msg = format!("hot swap policy canceled for resource {}", resource);
    s.println(&msg);
    Ok(())
}

// ---- diagnostics block ------------------------------------------------

fn diag_ls(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let lines = match s.system.resource(resource) {
        Ok(r) => r
            .diag_tests
            .iter()
            .map(|t| format!("{}  [{}]", t.name, t.status))
            .collect::<Vec<_>>(),
        Err(e) => return Err(s.fail(e)),
    };
    for line in lines {
        if !s.println(&line) {
            break;
        }
    }
    Ok(())
}

fn diag_start(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let test = s.ask_string("Test name: ")?;
    if let Err(e) = s.system.run_diag(resource, &test) {
        return Err(s.fail(e));
    }
    let msg = format!("test {} completed", test);
    s.println(&msg);
    Ok(())
}

fn diag_status(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let test = s.ask_string("Test name: ")?;
    let text = match s.system.resource(resource) {
        Ok(r) => match r.diag_tests.iter().find(|t| t.name == test) {
            Some(t) => format!("{}: {}", t.name, t.status),
            None => return Err(s.fail(BackendError::NoDiagTest(test))),
        },
        Err(e) => return Err(s.fail(e)),
    };
    s.println(&text);
    Ok(())
}

// ---- firmware block ---------------------------------------------------

fn firmware_banks(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let lines = match s.system.resource(resource) {
        Ok(r) => r
            .firmware
            .iter()
            .map(|b| {
                format!(
                    "bank {}: version {}{}",
                    b.id,
                    b.version,
                    if b.active { "  (active)" } else { "" }
                )
            })
            .collect::<Vec<_>>(),
        Err(e) => return Err(s.fail(e)),
    };
    for line in lines {
        if !s.println(&line) {
            break;
        }
    }
    Ok(())
}

fn firmware_start(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let bank = s.ask_int("Bank id: ")?;
    if let Err(e) = s.system.start_upgrade(resource, bank) {
        return Err(s.fail(e));
    }
    let msg = format!("upgrade started on bank {}", bank);
    s.println(&msg);
    Ok(())
}

fn firmware_status(s: &mut ShellSession) -> CommandResult {
    let resource = s.env_resource()?;
    let lines = match s.system.resource(resource) {
        Ok(r) => r
            .firmware
            .iter()
            .map(|b| format!("bank {}: {}", b.id, b.upgrade_status))
            .collect::<Vec<_>>(),
        Err(e) => return Err(s.fail(e)),
    };
    for line in lines {
        if !s.println(&line) {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_BLOCKS: &[Block] = &[
        Block::Main,
        Block::Sensor,
        Block::Control,
        Block::Inventory,
        Block::Annunciator,
        Block::HotSwap,
        Block::Diag,
        Block::Firmware,
    ];

    #[test]
    fn test_no_block_sees_duplicate_names() {
        let registry = registry();
        for &block in ALL_BLOCKS {
            let mut names = registry.visible_names(block);
            let total = names.len();
            names.sort();
            names.dedup();
            assert_eq!(names.len(), total, "duplicate command visible in {}", block);
        }
    }

    #[test]
    fn test_entry_commands_visible_everywhere() {
        let registry = registry();
        for &block in ALL_BLOCKS {
            for entry in ["sen", "ctrl", "inv", "ann", "hs", "diag", "fw"] {
                assert!(
                    matches!(registry.lookup(entry, block), Lookup::Found(_)),
                    "{} not visible in {}",
                    entry,
                    block
                );
            }
        }
    }

    #[test]
    fn test_block_commands_hidden_from_main() {
        let registry = registry();
        for name in ["setthres", "setstate", "addarea", "acknow", "policycancel"] {
            assert!(
                matches!(registry.lookup(name, Block::Main), Lookup::NotFound),
                "{} leaked into the main block",
                name
            );
        }
    }

    #[test]
    fn test_every_command_has_usage_help() {
        for def in COMMANDS {
            assert!(
                def.help.starts_with(def.name),
                "help for {} does not start with its usage line",
                def.name
            );
        }
    }

    #[test]
    fn test_quit_is_universal() {
        let registry = registry();
        for &block in ALL_BLOCKS {
            assert!(matches!(registry.lookup("quit", block), Lookup::Found(_)));
            assert!(matches!(registry.lookup("q", block), Lookup::Found(d) if d.name == "q"));
        }
    }
}
