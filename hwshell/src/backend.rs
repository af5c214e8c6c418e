//! Managed-system backend
//!
//! Command handlers talk to the hardware through the [`ManagedSystem`]
//! trait; [`SimSystem`] is the in-process implementation backing both the
//! demo binary and the tests. The model is deliberately small: resources
//! carrying sensors, controls, inventory areas, announcements, diagnostic
//! tests, and firmware banks.

use std::fmt;

use thiserror::Error;

/// Backend operation failures; handlers print these and report a command
/// error to the dispatcher.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("no such resource: {0}")]
    NoResource(u32),

    #[error("resource {resource} has no instrument {instrument}")]
    NoInstrument { resource: u32, instrument: u32 },

    #[error("resource {resource} has no inventory area {area}")]
    NoArea { resource: u32, area: u32 },

    #[error("resource {resource} has no announcement {id}")]
    NoAnnouncement { resource: u32, id: u32 },

    #[error("no such diagnostic test: {0}")]
    NoDiagTest(String),

    #[error("no such firmware bank: {0}")]
    NoBank(u32),
}

/// Resource severity, ordered most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    Major,
    Minor,
    Ok,
    Informational,
}

impl Severity {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "critical" | "crit" => Some(Self::Critical),
            "major" => Some(Self::Major),
            "minor" => Some(Self::Minor),
            "ok" => Some(Self::Ok),
            "info" | "informational" => Some(Self::Informational),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Critical => "CRITICAL",
            Self::Major => "MAJOR",
            Self::Minor => "MINOR",
            Self::Ok => "OK",
            Self::Informational => "INFORMATIONAL",
        };
        f.write_str(name)
    }
}

/// Hot-swap lifecycle of a field-replaceable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotSwapState {
    Inactive,
    InsertionPending,
    Active,
    ExtractionPending,
}

impl fmt::Display for HotSwapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inactive => "INACTIVE",
            Self::InsertionPending => "INSERTION PENDING",
            Self::Active => "ACTIVE",
            Self::ExtractionPending => "EXTRACTION PENDING",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Sensor {
    pub num: u32,
    pub name: String,
    pub reading: f64,
    pub unit: String,
    pub enabled: bool,
    pub events_enabled: bool,
    pub threshold_low: f64,
    pub threshold_high: f64,
}

#[derive(Debug, Clone)]
pub struct Control {
    pub num: u32,
    pub name: String,
    pub state: String,
}

#[derive(Debug, Clone)]
pub struct InventoryArea {
    pub id: u32,
    pub kind: String,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct Announcement {
    pub id: u32,
    pub severity: Severity,
    pub text: String,
    pub acknowledged: bool,
}

#[derive(Debug, Clone)]
pub struct DiagTest {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct FirmwareBank {
    pub id: u32,
    pub version: String,
    pub active: bool,
    pub upgrade_status: String,
}

/// One manageable resource and everything hanging off it.
#[derive(Debug, Clone)]
pub struct Resource {
    pub id: u32,
    pub tag: String,
    pub severity: Severity,
    pub powered: bool,
    pub hot_swap: HotSwapState,
    pub sensors: Vec<Sensor>,
    pub controls: Vec<Control>,
    pub inventory: Vec<InventoryArea>,
    pub announcements: Vec<Announcement>,
    pub diag_tests: Vec<DiagTest>,
    pub firmware: Vec<FirmwareBank>,
    next_area_id: u32,
    next_announcement_id: u32,
}

impl Resource {
    pub fn new(id: u32, tag: &str) -> Self {
        Self {
            id,
            tag: tag.to_string(),
            severity: Severity::Ok,
            powered: true,
            hot_swap: HotSwapState::Active,
            sensors: Vec::new(),
            controls: Vec::new(),
            inventory: Vec::new(),
            announcements: Vec::new(),
            diag_tests: Vec::new(),
            firmware: Vec::new(),
            next_area_id: 1,
            next_announcement_id: 1,
        }
    }
}

/// The hardware-management surface the command handlers drive.
pub trait ManagedSystem {
    /// Re-enumerates the managed resources, returning how many are present.
    fn discover(&mut self) -> usize;

    fn resources(&self) -> &[Resource];

    fn resource(&self, id: u32) -> Result<&Resource, BackendError>;

    fn resource_mut(&mut self, id: u32) -> Result<&mut Resource, BackendError>;

    fn set_power(&mut self, id: u32, on: bool) -> Result<(), BackendError>;

    fn reset(&mut self, id: u32, cold: bool) -> Result<(), BackendError>;

    fn set_tag(&mut self, id: u32, tag: &str) -> Result<(), BackendError>;

    fn set_severity(&mut self, id: u32, severity: Severity) -> Result<(), BackendError>;

    fn sensor_mut(&mut self, id: u32, num: u32) -> Result<&mut Sensor, BackendError>;

    fn control_mut(&mut self, id: u32, num: u32) -> Result<&mut Control, BackendError>;

    fn add_area(&mut self, id: u32, kind: &str) -> Result<u32, BackendError>;

    fn delete_area(&mut self, id: u32, area: u32) -> Result<(), BackendError>;

    fn set_field(&mut self, id: u32, area: u32, name: &str, value: &str)
        -> Result<(), BackendError>;

    fn add_announcement(
        &mut self,
        id: u32,
        severity: Severity,
        text: &str,
    ) -> Result<u32, BackendError>;

    fn delete_announcement(&mut self, id: u32, ann: u32) -> Result<(), BackendError>;

    fn acknowledge(&mut self, id: u32, ann: Option<u32>) -> Result<(), BackendError>;

    fn set_hot_swap(&mut self, id: u32, state: HotSwapState) -> Result<(), BackendError>;

    fn run_diag(&mut self, id: u32, test: &str) -> Result<(), BackendError>;

    fn start_upgrade(&mut self, id: u32, bank: u32) -> Result<(), BackendError>;
}

/// In-process simulated system with a small fixed topology.
#[derive(Debug, Default)]
pub struct SimSystem {
    resources: Vec<Resource>,
    discovered: bool,
}

impl SimSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small demo topology: a chassis with environment sensors and a fan
    /// tray with a speed control.
    pub fn with_demo_fixture() -> Self {
        let mut chassis = Resource::new(1, "System Chassis");
        chassis.sensors.push(Sensor {
            num: 1,
            name: "Ambient Temp".to_string(),
            reading: 24.5,
            unit: "degrees C".to_string(),
            enabled: true,
            events_enabled: true,
            threshold_low: 5.0,
            threshold_high: 45.0,
        });
        chassis.sensors.push(Sensor {
            num: 2,
            name: "Supply Voltage".to_string(),
            reading: 12.1,
            unit: "Volts".to_string(),
            enabled: true,
            events_enabled: false,
            threshold_low: 11.4,
            threshold_high: 12.6,
        });
        chassis.inventory.push(InventoryArea {
            id: 1,
            kind: "board".to_string(),
            fields: vec![
                ("manufacturer".to_string(), "Acme".to_string()),
                ("part".to_string(), "CH-100".to_string()),
            ],
        });
        chassis.next_area_id = 2;
        chassis.diag_tests.push(DiagTest {
            name: "selftest".to_string(),
            status: "READY".to_string(),
        });
        chassis.firmware.push(FirmwareBank {
            id: 1,
            version: "1.4.2".to_string(),
            active: true,
            upgrade_status: "IDLE".to_string(),
        });
        chassis.firmware.push(FirmwareBank {
            id: 2,
            version: "1.4.0".to_string(),
            active: false,
            upgrade_status: "IDLE".to_string(),
        });

        let mut fans = Resource::new(2, "Fan Tray");
        fans.sensors.push(Sensor {
            num: 1,
            name: "Fan Speed".to_string(),
            reading: 5200.0,
            unit: "RPM".to_string(),
            enabled: true,
            events_enabled: true,
            threshold_low: 1000.0,
            threshold_high: 9000.0,
        });
        fans.controls.push(Control {
            num: 1,
            name: "Fan Speed Control".to_string(),
            state: "auto".to_string(),
        });

        Self {
            resources: vec![chassis, fans],
            discovered: false,
        }
    }

    pub fn is_discovered(&self) -> bool {
        self.discovered
    }
}

impl ManagedSystem for SimSystem {
    fn discover(&mut self) -> usize {
        self.discovered = true;
        self.resources.len()
    }

    fn resources(&self) -> &[Resource] {
        &self.resources
    }

    fn resource(&self, id: u32) -> Result<&Resource, BackendError> {
        self.resources
            .iter()
            .find(|r| r.id == id)
            .ok_or(BackendError::NoResource(id))
    }

    fn resource_mut(&mut self, id: u32) -> Result<&mut Resource, BackendError> {
        self.resources
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(BackendError::NoResource(id))
    }

    fn set_power(&mut self, id: u32, on: bool) -> Result<(), BackendError> {
        self.resource_mut(id)?.powered = on;
        Ok(())
    }

    fn reset(&mut self, id: u32, _cold: bool) -> Result<(), BackendError> {
        let resource = self.resource_mut(id)?;
        resource.powered = true;
        Ok(())
    }

    fn set_tag(&mut self, id: u32, tag: &str) -> Result<(), BackendError> {
        self.resource_mut(id)?.tag = tag.to_string();
        Ok(())
    }

    fn set_severity(&mut self, id: u32, severity: Severity) -> Result<(), BackendError> {
        self.resource_mut(id)?.severity = severity;
        Ok(())
    }

    fn sensor_mut(&mut self, id: u32, num: u32) -> Result<&mut Sensor, BackendError> {
        self.resource_mut(id)?
            .sensors
            .iter_mut()
            .find(|s| s.num == num)
            .ok_or(BackendError::NoInstrument {
                resource: id,
                instrument: num,
            })
    }

    fn control_mut(&mut self, id: u32, num: u32) -> Result<&mut Control, BackendError> {
        self.resource_mut(id)?
            .controls
            .iter_mut()
            .find(|c| c.num == num)
            .ok_or(BackendError::NoInstrument {
                resource: id,
                instrument: num,
            })
    }

    fn add_area(&mut self, id: u32, kind: &str) -> Result<u32, BackendError> {
        let resource = self.resource_mut(id)?;
        let area_id = resource.next_area_id;
        resource.next_area_id += 1;
        resource.inventory.push(InventoryArea {
            id: area_id,
            kind: kind.to_string(),
            fields: Vec::new(),
        });
        Ok(area_id)
    }

    fn delete_area(&mut self, id: u32, area: u32) -> Result<(), BackendError> {
        let resource = self.resource_mut(id)?;
        let before = resource.inventory.len();
        resource.inventory.retain(|a| a.id != area);
        if resource.inventory.len() == before {
            return Err(BackendError::NoArea { resource: id, area });
        }
        Ok(())
    }

    fn set_field(
        &mut self,
        id: u32,
        area: u32,
        name: &str,
        value: &str,
    ) -> Result<(), BackendError> {
        let resource = self.resource_mut(id)?;
        let area = resource
            .inventory
            .iter_mut()
            .find(|a| a.id == area)
            .ok_or(BackendError::NoArea { resource: id, area })?;
        if let Some(field) = area.fields.iter_mut().find(|(n, _)| n == name) {
            field.1 = value.to_string();
        } else {
            area.fields.push((name.to_string(), value.to_string()));
        }
        Ok(())
    }

    fn add_announcement(
        &mut self,
        id: u32,
        severity: Severity,
        text: &str,
    ) -> Result<u32, BackendError> {
        let resource = self.resource_mut(id)?;
        let ann_id = resource.next_announcement_id;
        resource.next_announcement_id += 1;
        resource.announcements.push(Announcement {
            id: ann_id,
            severity,
            text: text.to_string(),
            acknowledged: false,
        });
        Ok(ann_id)
    }

    fn delete_announcement(&mut self, id: u32, ann: u32) -> Result<(), BackendError> {
        let resource = self.resource_mut(id)?;
        let before = resource.announcements.len();
        resource.announcements.retain(|a| a.id != ann);
        if resource.announcements.len() == before {
            return Err(BackendError::NoAnnouncement { resource: id, id: ann });
        }
        Ok(())
    }

    fn acknowledge(&mut self, id: u32, ann: Option<u32>) -> Result<(), BackendError> {
        let resource = self.resource_mut(id)?;
        match ann {
            None => {
                for a in &mut resource.announcements {
                    a.acknowledged = true;
                }
                Ok(())
            }
            Some(ann_id) => {
                let entry = resource
                    .announcements
                    .iter_mut()
                    .find(|a| a.id == ann_id)
                    .ok_or(BackendError::NoAnnouncement {
                        resource: id,
                        id: ann_id,
                    })?;
                entry.acknowledged = true;
                Ok(())
            }
        }
    }

    fn set_hot_swap(&mut self, id: u32, state: HotSwapState) -> Result<(), BackendError> {
        self.resource_mut(id)?.hot_swap = state;
        Ok(())
    }

    fn run_diag(&mut self, id: u32, test: &str) -> Result<(), BackendError> {
        let resource = self.resource_mut(id)?;
        let entry = resource
            .diag_tests
            .iter_mut()
            .find(|t| t.name == test)
            .ok_or_else(|| BackendError::NoDiagTest(test.to_string()))?;
        entry.status = "PASSED".to_string();
        Ok(())
    }

    fn start_upgrade(&mut self, id: u32, bank: u32) -> Result<(), BackendError> {
        let resource = self.resource_mut(id)?;
        let entry = resource
            .firmware
            .iter_mut()
            .find(|b| b.id == bank)
            .ok_or(BackendError::NoBank(bank))?;
        entry.upgrade_status = "IN PROGRESS".to_string();
        Ok(())
    }
}
