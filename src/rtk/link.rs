//! RTK base station link
//!
//! A [`DeviceSession`] for the RTK port plus the survey-in monitor that
//! reports when the base station can start sending corrections.
//!
//! The survey-in duration and accuracy of an [`RtkConfig`] go to the
//! receiver unchanged. The monitor applies its own READY threshold.

use super::feed::{AccuracyFeed, BaseStation};
use super::monitor::SurveyInMonitor;
use crate::device::DeviceSession;
use crate::transport::{PortKind, PortTransport};
use skyfleet_shared::{
    DeviceStatus, FleetError, RtkConfig, RtkInfo, SatelliteConfig, SatelliteUsage,
};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{info, warn};

pub struct RtkLink {
    session: DeviceSession<RtkConfig>,
    base: Arc<dyn BaseStation>,
    survey: SurveyInMonitor,
    satellites: SatelliteConfig,
}

impl RtkLink {
    pub fn new(
        transport: Arc<dyn PortTransport<RtkConfig>>,
        base: Arc<dyn BaseStation>,
        feed: Box<dyn AccuracyFeed>,
        tick: Duration,
    ) -> Self {
        Self {
            session: DeviceSession::new(PortKind::Rtk, transport),
            base,
            survey: SurveyInMonitor::new(feed, tick),
            satellites: all_constellations(),
        }
    }

    /// Open the base station port and begin survey-in (or fixed mode)
    ///
    /// The port is released again when the receiver refuses the survey-in.
    pub async fn connect(&mut self, config: RtkConfig) -> Result<(), FleetError> {
        let survey_in = config.survey_in;
        let (duration_s, accuracy_m) = (config.survey_in_duration_s, config.survey_in_accuracy_m);
        self.session.connect(config).await?;

        if survey_in {
            if let Err(e) = self.base.start_survey_in(duration_s, accuracy_m).await {
                warn!("[RTK] Receiver refused survey-in: {}", e);
                if let Err(release) = self.session.disconnect().await {
                    warn!("[RTK] Release after refused survey-in failed: {}", release);
                }
                return Err(FleetError::transport(e));
            }
            self.survey.start().await;
        } else {
            self.survey.mark_fixed().await;
        }
        Ok(())
    }

    /// Stop the survey-in, then release the port
    pub async fn disconnect(&mut self) -> Result<(), FleetError> {
        self.survey.stop().await;
        self.session.disconnect().await
    }

    pub fn current_config(&self) -> Option<RtkConfig> {
        self.session.current_config()
    }

    pub fn status(&self) -> DeviceStatus {
        self.session.status()
    }

    /// Survey-in snapshot plus the satellites in view while connected
    pub async fn info(&self) -> RtkInfo {
        let mut info: RtkInfo = self.survey.snapshot().await.into();
        if !self.session.is_connected() {
            return info;
        }

        match self.base.satellites().await {
            Ok(sky) => {
                info.satellites = sky
                    .into_iter()
                    .map(|(constellation, count)| SatelliteUsage {
                        constellation: constellation.into(),
                        count,
                        using: self.satellites.enables(constellation),
                    })
                    .collect();
            }
            Err(e) => warn!("[RTK] Satellite query failed: {}", e),
        }
        info
    }

    pub fn satellites(&self) -> SatelliteConfig {
        self.satellites
    }

    /// Replace the constellation selection
    pub fn update_satellites(
        &mut self,
        config: SatelliteConfig,
    ) -> Result<SatelliteConfig, FleetError> {
        if !(config.gps || config.glonass || config.galileo || config.beidou) {
            return Err(FleetError::Validation(
                "at least one constellation must stay enabled".into(),
            ));
        }
        if !config.pvt {
            warn!("[RTK] PVT output disabled, base position will not be reported");
        }

        info!(
            "[RTK] Satellites: gps={} glonass={} galileo={} beidou={}",
            config.gps, config.glonass, config.galileo, config.beidou
        );
        self.satellites = config;
        Ok(config)
    }
}

fn all_constellations() -> SatelliteConfig {
    SatelliteConfig {
        gps: true,
        glonass: true,
        galileo: true,
        beidou: true,
        pvt: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtk::feed::SimulatedSurveyIn;
    use crate::rtk::sim::{SimulatedReceiver, SurveyInRequest};
    use crate::transport::SimulatedPorts;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use skyfleet_shared::{Constellation, SurveyInStatus};

    /// Receiver that refuses everything
    struct DeadReceiver;

    #[async_trait]
    impl BaseStation for DeadReceiver {
        async fn start_survey_in(&self, _min_duration_s: u32, _accuracy_limit_m: f64) -> Result<()> {
            Err(anyhow!("receiver not responding"))
        }

        async fn accuracy(&self) -> Result<f64> {
            Err(anyhow!("receiver not responding"))
        }

        async fn satellites(&self) -> Result<Vec<(Constellation, u32)>> {
            Err(anyhow!("receiver not responding"))
        }
    }

    fn rtk(survey_in: bool) -> RtkConfig {
        RtkConfig {
            device: "/dev/ttyACM0".into(),
            baud_rate: 115200,
            survey_in,
            survey_in_duration_s: 60,
            survey_in_accuracy_m: 2.0,
        }
    }

    fn link_with(ports: Arc<SimulatedPorts>, base: Arc<dyn BaseStation>) -> RtkLink {
        let transport: Arc<dyn PortTransport<RtkConfig>> = ports;
        RtkLink::new(
            transport,
            base,
            Box::new(SimulatedSurveyIn::seeded(3)),
            Duration::from_secs(1),
        )
    }

    fn link_over(ports: Arc<SimulatedPorts>) -> RtkLink {
        link_with(ports, Arc::new(SimulatedReceiver::seeded(3)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_survey_in_starts_on_connect_and_stops_on_disconnect() {
        let ports = Arc::new(SimulatedPorts::default());
        let mut link = link_over(ports.clone());
        assert_eq!(link.info().await.status(), SurveyInStatus::SvinNone);

        link.connect(rtk(true)).await.unwrap();
        assert_eq!(link.status(), DeviceStatus::DeviceConnected);
        assert_eq!(link.info().await.status(), SurveyInStatus::SvinInProgress);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(link.info().await.survey_in_duration_s, 2);

        link.disconnect().await.unwrap();
        let info = link.info().await;
        assert_eq!(info.status(), SurveyInStatus::SvinNone);
        assert_eq!(info.survey_in_duration_s, 0);
        assert!(link.current_config().is_none());
        assert!(ports.holder(PortKind::Rtk).await.is_none());
    }

    #[tokio::test]
    async fn test_fixed_base_skips_survey_in() {
        let mut link = link_over(Arc::new(SimulatedPorts::default()));
        link.connect(rtk(false)).await.unwrap();

        assert_eq!(link.info().await.status(), SurveyInStatus::SvinFixed);
        assert_eq!(link.current_config(), Some(rtk(false)));
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_survey_idle() {
        let ports = Arc::new(SimulatedPorts::default());
        ports.fail_next_connect("no receiver").await;
        let mut link = link_over(ports);

        assert!(link.connect(rtk(true)).await.is_err());
        assert_eq!(link.info().await.status(), SurveyInStatus::SvinNone);
        assert_eq!(link.status(), DeviceStatus::DeviceDisconnected);
    }

    #[tokio::test]
    async fn test_satellite_update_needs_a_constellation() {
        let mut link = link_over(Arc::new(SimulatedPorts::default()));
        assert!(link.satellites().gps);

        let gps_only = SatelliteConfig {
            gps: true,
            pvt: true,
            ..Default::default()
        };
        assert_eq!(link.update_satellites(gps_only).unwrap(), gps_only);
        assert_eq!(link.satellites(), gps_only);

        let none = SatelliteConfig {
            pvt: true,
            ..Default::default()
        };
        assert!(matches!(
            link.update_satellites(none),
            Err(FleetError::Validation(_))
        ));
        assert_eq!(link.satellites(), gps_only);
    }

    #[tokio::test]
    async fn test_survey_in_limits_reach_the_receiver() {
        let receiver = Arc::new(SimulatedReceiver::seeded(3));
        let base: Arc<dyn BaseStation> = receiver.clone();
        let mut link = link_with(Arc::new(SimulatedPorts::default()), base);

        link.connect(rtk(false)).await.unwrap();
        assert!(receiver.survey_request().await.is_none());
        link.disconnect().await.unwrap();

        link.connect(rtk(true)).await.unwrap();
        assert_eq!(
            receiver.survey_request().await,
            Some(SurveyInRequest {
                min_duration_s: 60,
                accuracy_limit_m: 2.0,
            })
        );
    }

    #[tokio::test]
    async fn test_refused_survey_in_releases_port() {
        let ports = Arc::new(SimulatedPorts::default());
        let mut link = link_with(ports.clone(), Arc::new(DeadReceiver));

        let err = link.connect(rtk(true)).await.unwrap_err();
        assert!(matches!(err, FleetError::Transport(_)));
        assert_eq!(link.status(), DeviceStatus::DeviceDisconnected);
        assert_eq!(link.info().await.status(), SurveyInStatus::SvinNone);
        assert!(ports.holder(PortKind::Rtk).await.is_none());
    }

    #[tokio::test]
    async fn test_info_lists_satellites_while_connected() {
        let mut link = link_over(Arc::new(SimulatedPorts::default()));
        assert!(link.info().await.satellites.is_empty());

        link.connect(rtk(false)).await.unwrap();
        link.update_satellites(SatelliteConfig {
            gps: true,
            galileo: true,
            pvt: true,
            ..Default::default()
        })
        .unwrap();

        let satellites = link.info().await.satellites;
        assert_eq!(satellites.len(), 4);
        for usage in &satellites {
            let expected = matches!(
                usage.constellation(),
                Constellation::Gps | Constellation::Galileo
            );
            assert_eq!(usage.using, expected);
            assert!(usage.count > 0);
        }

        link.disconnect().await.unwrap();
        assert!(link.info().await.satellites.is_empty());
    }

    #[tokio::test]
    async fn test_failed_satellite_query_keeps_survey_info() {
        let mut link = link_with(Arc::new(SimulatedPorts::default()), Arc::new(DeadReceiver));
        link.connect(rtk(false)).await.unwrap();

        let info = link.info().await;
        assert_eq!(info.status(), SurveyInStatus::SvinFixed);
        assert!(info.satellites.is_empty());
    }
}
