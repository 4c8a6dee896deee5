//! Station: one Director, fleet-wide controls, one radio link and one RTK
//! link
//!
//! Each stateful component sits behind its own mutex, so operations on one
//! component run one at a time while the others stay available.

use crate::config::StationConfig;
use crate::device::{DeviceSession, LoraLink};
use crate::director::Director;
use crate::drone::{FleetControl, SimulatedFleet};
use crate::rtk::{AccuracyFeed, BaseStation, BaseStationFeed, RtkLink, SimulatedReceiver};
use crate::transport::{PortCatalog, PortKind, PortTransport, SimulatedPorts};
use skyfleet_shared::{FleetError, LoraConfig, PortDevice, RtkConfig};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub struct Station {
    pub director: Mutex<Director>,
    pub fleet: FleetControl,
    pub lora: Mutex<LoraLink>,
    pub rtk: Mutex<RtkLink>,
    catalog: Arc<dyn PortCatalog>,
}

impl Station {
    pub fn new(
        director: Director,
        fleet: FleetControl,
        lora: LoraLink,
        rtk: RtkLink,
        catalog: Arc<dyn PortCatalog>,
    ) -> Self {
        Self {
            director: Mutex::new(director),
            fleet,
            lora: Mutex::new(lora),
            rtk: Mutex::new(rtk),
            catalog,
        }
    }

    /// Station over simulated ports, fleet and base station
    pub fn simulated(config: &StationConfig) -> Self {
        let receiver: Arc<dyn BaseStation> = match config.simulation_seed {
            Some(seed) => Arc::new(SimulatedReceiver::seeded(seed)),
            None => Arc::new(SimulatedReceiver::new()),
        };
        Self::with_receiver(config, receiver)
    }

    /// Simulated ports and fleet around `receiver`; survey-in accuracy is
    /// read from the receiver
    pub fn with_receiver(config: &StationConfig, receiver: Arc<dyn BaseStation>) -> Self {
        let ports = Arc::new(SimulatedPorts::new(config.serial_devices.iter().cloned()));
        let fleet = Arc::new(SimulatedFleet::with_drones(
            config.settle_polls,
            config.simulated_drones.iter().copied(),
        ));

        let feed: Box<dyn AccuracyFeed> = Box::new(BaseStationFeed::new(receiver.clone()));
        let lora_transport: Arc<dyn PortTransport<LoraConfig>> = ports.clone();
        let rtk_transport: Arc<dyn PortTransport<RtkConfig>> = ports.clone();

        Self::new(
            Director::new(fleet.clone(), fleet.clone(), config.director.clone()),
            FleetControl::new(fleet.clone(), fleet),
            DeviceSession::new(PortKind::Lora, lora_transport),
            RtkLink::new(rtk_transport, receiver, feed, config.survey_in_tick),
            ports,
        )
    }

    /// Serial devices selectable for either port
    pub async fn available_devices(&self) -> Result<Vec<PortDevice>, FleetError> {
        self.catalog
            .available_devices()
            .await
            .map_err(FleetError::transport)
    }

    /// Release both ports and drop the fleet session
    pub async fn shutdown(&self) {
        if let Err(e) = self.rtk.lock().await.disconnect().await {
            warn!("[RTK] Release on shutdown failed: {}", e);
        }
        if let Err(e) = self.lora.lock().await.disconnect().await {
            warn!("[LORA] Release on shutdown failed: {}", e);
        }
        let mut director = self.director.lock().await;
        if director.is_initialized() {
            director.destroy();
        }
        info!("Station shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyfleet_shared::{DeviceStatus, DroneAction, SurveyInStatus};
    use std::time::Duration;

    #[tokio::test]
    async fn test_simulated_station_lists_configured_devices() {
        let config = StationConfig {
            serial_devices: vec!["/dev/ttyS3".into()],
            ..Default::default()
        };
        let station = Station::simulated(&config);

        let devices = station.available_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "/dev/ttyS3");
    }

    #[tokio::test]
    async fn test_shutdown_releases_ports() {
        let station = Station::simulated(&StationConfig::default());
        station
            .lora
            .lock()
            .await
            .connect(LoraConfig {
                device: "/dev/ttyUSB0".into(),
                baud_rate: 57600,
            })
            .await
            .unwrap();

        station.shutdown().await;
        assert_eq!(station.lora.lock().await.status(), DeviceStatus::DeviceDisconnected);
        assert!(!station.director.lock().await.is_initialized());
    }

    #[tokio::test]
    async fn test_fleet_actions_reach_configured_drones() {
        let config = StationConfig {
            simulated_drones: vec![4, 2],
            ..Default::default()
        };
        let station = Station::simulated(&config);

        let report = station.fleet.perform(DroneAction::ActionArm, &[]).await.unwrap();
        assert_eq!(report.targets, 2);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_survey_in_driven_by_receiver() {
        let config = StationConfig {
            survey_in_tick: Duration::from_secs(1),
            ..Default::default()
        };
        let station = Station::with_receiver(&config, Arc::new(SimulatedReceiver::seeded(11)));
        station
            .rtk
            .lock()
            .await
            .connect(RtkConfig {
                device: "/dev/ttyACM0".into(),
                baud_rate: 115200,
                survey_in: true,
                survey_in_duration_s: 5,
                survey_in_accuracy_m: 0.5,
            })
            .await
            .unwrap();

        for _ in 0..10_000 {
            if station.rtk.lock().await.info().await.status() == SurveyInStatus::SvinReady {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        let info = station.rtk.lock().await.info().await;
        assert_eq!(info.status(), SurveyInStatus::SvinReady);
        assert!(info.survey_in_duration_s >= 5);
        assert!(info.survey_in_accuracy_m <= 1.0);
        assert_eq!(info.satellites.len(), 4);
    }
}
