//! Outbound documents
//!
//! Both are built fresh for every publish from the configuration and the
//! current position.

use autoblind_protocol::{Announcement, DeviceDescriptor, StatePayload};

use super::device::DeviceState;
use crate::config::BlindConfig;

/// State report for a position
pub fn state_payload(position: u32) -> StatePayload {
    DeviceState::from_position(position).to_payload()
}

/// Discovery record for this device
///
/// The state topic doubles as the availability topic and the discovery
/// base as the attributes topic.
pub fn announcement(config: &BlindConfig) -> Announcement<'_> {
    let device = &config.device;
    let mqtt = &config.mqtt;
    Announcement {
        json_attributes_topic: &mqtt.discovery_topic,
        availability_topic: &mqtt.state_topic,
        name: &device.entity_name,
        unique_id: &device.unique_id,
        command_topic: &mqtt.command_topic,
        state_topic: &mqtt.state_topic,
        schema: Announcement::SCHEMA,
        brightness: true,
        ct: false,
        xy: false,
        device: DeviceDescriptor {
            identifiers: [&device.unique_id],
            name: &device.name,
            model: &device.model,
            sw_version: &device.sw_version,
            manufacturer: &device.manufacturer,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoblind_protocol::PowerState;

    #[test]
    fn test_state_payload() {
        assert_eq!(
            state_payload(320),
            StatePayload {
                state: PowerState::On,
                brightness: 10
            }
        );
        assert_eq!(state_payload(0).state, PowerState::Off);
    }

    #[test]
    fn test_announcement_links_topics() {
        let config = BlindConfig::default();
        let a = announcement(&config);
        assert_eq!(a.availability_topic, a.state_topic);
        assert_eq!(a.json_attributes_topic, "homeassistant/light/autoblind");
        assert_eq!(a.device.identifiers, [a.unique_id]);
        assert!(a.brightness);
        assert!(!a.ct && !a.xy);
        assert_eq!(a.schema, "json");
    }
}
