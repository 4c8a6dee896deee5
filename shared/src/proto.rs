//! SkyFleet Protocol Messages
//!
//! Hand-derived protobuf messages exchanged between the ground station and
//! operator clients. Value types (`GpsPoint`, `LocalOffset`) double as the
//! domain types used by the Director.

/// Absolute GNSS position
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct GpsPoint {
    /// Latitude in degrees, north positive
    #[prost(double, tag = "1")]
    pub latitude: f64,
    /// Longitude in degrees, east positive
    #[prost(double, tag = "2")]
    pub longitude: f64,
    /// Altitude in meters
    #[prost(double, tag = "3")]
    pub altitude: f64,
}

/// Offset in meters on the tangent plane of an origin (x east, y north, z up)
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct LocalOffset {
    #[prost(double, tag = "1")]
    pub x: f64,
    #[prost(double, tag = "2")]
    pub y: f64,
    #[prost(double, tag = "3")]
    pub z: f64,
}

/// Horizontal slot position relative to the formation origin
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct PlanarOffset {
    #[prost(double, tag = "1")]
    pub x: f64,
    #[prost(double, tag = "2")]
    pub y: f64,
}

/// Placeholder body for requests and replies without parameters
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Empty {}

// ---------------------------------------------------------------------------
// Status enumerations
// ---------------------------------------------------------------------------

/// Lifecycle of a drone-to-slot assignment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AssignmentState {
    AssignmentUnknown = 0,
    AssignmentAssigning = 1,
    AssignmentAssigned = 2,
    AssignmentTransferred = 3,
    AssignmentCancelled = 4,
}

/// Connection state of an exclusive hardware port
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DeviceStatus {
    DeviceDisconnected = 0,
    DeviceConnecting = 1,
    DeviceConnected = 2,
    DeviceConflict = 3,
}

/// Readiness of the RTK base station
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SurveyInStatus {
    SvinNone = 0,
    SvinInProgress = 1,
    SvinReady = 2,
    /// Base runs on a fixed, pre-surveyed position
    SvinFixed = 3,
}

/// Fleet-wide command sent to individual drones
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DroneAction {
    ActionUnknown = 0,
    ActionArm = 1,
    ActionDisarm = 2,
    /// Return to the launch point
    ActionHome = 3,
    ActionLand = 4,
    ActionTakeoff = 5,
    ActionHold = 6,
    /// Put the drone into low-power standby
    ActionSleep = 7,
    ActionWakeup = 8,
}

/// GNSS constellation tracked by the base station
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Constellation {
    ConstellationUnknown = 0,
    Gps = 1,
    Glonass = 2,
    Galileo = 3,
    Beidou = 4,
}

/// Failure taxonomy reported to operators
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ErrorKind {
    ErrUnknown = 0,
    ErrValidation = 1,
    ErrConflict = 2,
    ErrNotFound = 3,
    ErrState = 4,
    ErrTransport = 5,
}

// ---------------------------------------------------------------------------
// Director messages
// ---------------------------------------------------------------------------

/// Open a fleet session
///
/// Exactly one of `relative_slots` / `absolute_slots` must be populated.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InitDirector {
    #[prost(message, optional, tag = "1")]
    pub origin: Option<GpsPoint>,
    #[prost(message, repeated, tag = "2")]
    pub relative_slots: Vec<PlanarOffset>,
    #[prost(message, repeated, tag = "3")]
    pub absolute_slots: Vec<GpsPoint>,
    /// Formation heading in degrees
    #[prost(double, tag = "4")]
    pub heading: f64,
    /// Takeoff slot height in meters
    #[prost(double, tag = "5")]
    pub height: f64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct AssignDrone {
    #[prost(uint32, tag = "1")]
    pub drone_id: u32,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct MarkUnused {
    #[prost(uint32, tag = "1")]
    pub slot_index: u32,
}

/// Action for a set of drones; an empty `drone_ids` targets the whole fleet
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DroneActionRequest {
    #[prost(enumeration = "DroneAction", tag = "1")]
    pub action: i32,
    #[prost(uint32, repeated, tag = "2")]
    pub drone_ids: Vec<u32>,
}

/// Flight mode change for a set of drones; an empty `drone_ids` targets the
/// whole fleet
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChangeModeRequest {
    /// ArduCopter custom mode number
    #[prost(uint32, tag = "1")]
    pub mode: u32,
    #[prost(uint32, repeated, tag = "2")]
    pub drone_ids: Vec<u32>,
}

/// Outcome of an operation fanned out over several drones
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MultiOpReport {
    #[prost(uint32, tag = "1")]
    pub targets: u32,
    #[prost(uint32, tag = "2")]
    pub failed: u32,
    #[prost(string, repeated, tag = "3")]
    pub errors: Vec<String>,
}

/// Result of one convergence polling pass
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct CheckReport {
    #[prost(uint32, tag = "1")]
    pub still_assigning: u32,
    #[prost(uint32, tag = "2")]
    pub newly_assigned: u32,
    #[prost(uint32, tag = "3")]
    pub converged_total: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DirectorStatus {
    #[prost(uint32, tag = "1")]
    pub assigning: u32,
    #[prost(uint32, tag = "2")]
    pub assigned: u32,
    #[prost(uint32, tag = "3")]
    pub total: u32,
    #[prost(bool, tag = "4")]
    pub ready: bool,
    #[prost(string, tag = "5")]
    pub status: String,
    #[prost(string, tag = "6")]
    pub log: String,
}

// ---------------------------------------------------------------------------
// Port messages
// ---------------------------------------------------------------------------

/// Radio link port parameters
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LoraConfig {
    #[prost(string, tag = "1")]
    pub device: String,
    #[prost(uint32, tag = "2")]
    pub baud_rate: u32,
}

/// RTK base station port parameters
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RtkConfig {
    #[prost(string, tag = "1")]
    pub device: String,
    #[prost(uint32, tag = "2")]
    pub baud_rate: u32,
    /// Run a survey-in instead of using a fixed base position
    #[prost(bool, tag = "3")]
    pub survey_in: bool,
    /// Minimum survey-in duration requested from the receiver
    #[prost(uint32, tag = "4")]
    pub survey_in_duration_s: u32,
    /// Target survey-in accuracy requested from the receiver
    #[prost(double, tag = "5")]
    pub survey_in_accuracy_m: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LoraConfigReply {
    #[prost(message, optional, tag = "1")]
    pub config: Option<LoraConfig>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RtkConfigReply {
    #[prost(message, optional, tag = "1")]
    pub config: Option<RtkConfig>,
}

/// Enabled GNSS constellations on the base station
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct SatelliteConfig {
    #[prost(bool, tag = "1")]
    pub gps: bool,
    #[prost(bool, tag = "2")]
    pub glonass: bool,
    #[prost(bool, tag = "3")]
    pub galileo: bool,
    #[prost(bool, tag = "4")]
    pub beidou: bool,
    /// Emit navigation position/velocity/time output
    #[prost(bool, tag = "5")]
    pub pvt: bool,
}

/// Satellites seen for one constellation
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct SatelliteUsage {
    #[prost(enumeration = "Constellation", tag = "1")]
    pub constellation: i32,
    #[prost(uint32, tag = "2")]
    pub count: u32,
    /// Constellation enabled in the base station configuration
    #[prost(bool, tag = "3")]
    pub using: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RtkInfo {
    #[prost(enumeration = "SurveyInStatus", tag = "1")]
    pub status: i32,
    #[prost(uint64, tag = "2")]
    pub survey_in_duration_s: u64,
    #[prost(double, tag = "3")]
    pub survey_in_accuracy_m: f64,
    /// Empty while the RTK port is disconnected
    #[prost(message, repeated, tag = "4")]
    pub satellites: Vec<SatelliteUsage>,
}

/// A serial device selectable for a port
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PortDevice {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub description: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeviceList {
    #[prost(message, repeated, tag = "1")]
    pub devices: Vec<PortDevice>,
}

// ---------------------------------------------------------------------------
// Control plane framing
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ErrorInfo {
    #[prost(enumeration = "ErrorKind", tag = "1")]
    pub kind: i32,
    #[prost(string, tag = "2")]
    pub message: String,
}

/// Operator request
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Request {
    #[prost(uint64, tag = "1")]
    pub request_id: u64,
    #[prost(
        oneof = "request::Body",
        tags = "2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21"
    )]
    pub body: Option<request::Body>,
}

pub mod request {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Body {
        #[prost(message, tag = "2")]
        InitDirector(super::InitDirector),
        #[prost(message, tag = "3")]
        DestroyDirector(super::Empty),
        #[prost(message, tag = "4")]
        Assign(super::AssignDrone),
        #[prost(message, tag = "5")]
        CheckAssign(super::Empty),
        #[prost(message, tag = "6")]
        TransferAssign(super::Empty),
        #[prost(message, tag = "7")]
        CancelAssign(super::Empty),
        #[prost(message, tag = "8")]
        PollDirector(super::Empty),
        #[prost(message, tag = "9")]
        MarkUnused(super::MarkUnused),
        #[prost(message, tag = "10")]
        ConnectLora(super::LoraConfig),
        #[prost(message, tag = "11")]
        DisconnectLora(super::Empty),
        #[prost(message, tag = "12")]
        QueryLora(super::Empty),
        #[prost(message, tag = "13")]
        ConnectRtk(super::RtkConfig),
        #[prost(message, tag = "14")]
        DisconnectRtk(super::Empty),
        #[prost(message, tag = "15")]
        QueryRtk(super::Empty),
        #[prost(message, tag = "16")]
        RtkStatus(super::Empty),
        #[prost(message, tag = "17")]
        ListDevices(super::Empty),
        #[prost(message, tag = "18")]
        GetSatellites(super::Empty),
        #[prost(message, tag = "19")]
        UpdateSatellites(super::SatelliteConfig),
        #[prost(message, tag = "20")]
        DroneAction(super::DroneActionRequest),
        #[prost(message, tag = "21")]
        ChangeMode(super::ChangeModeRequest),
    }
}

/// Station reply; `error` is set when the request failed
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    #[prost(uint64, tag = "1")]
    pub request_id: u64,
    #[prost(message, optional, tag = "2")]
    pub error: Option<ErrorInfo>,
    #[prost(oneof = "response::Body", tags = "3, 4, 5, 6, 7, 8, 9, 10, 11")]
    pub body: Option<response::Body>,
}

pub mod response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Body {
        #[prost(message, tag = "3")]
        Done(super::Empty),
        #[prost(message, tag = "4")]
        MultiOp(super::MultiOpReport),
        #[prost(message, tag = "5")]
        Check(super::CheckReport),
        #[prost(message, tag = "6")]
        Director(super::DirectorStatus),
        #[prost(message, tag = "7")]
        Lora(super::LoraConfigReply),
        #[prost(message, tag = "8")]
        Rtk(super::RtkConfigReply),
        #[prost(message, tag = "9")]
        RtkInfo(super::RtkInfo),
        #[prost(message, tag = "10")]
        Devices(super::DeviceList),
        #[prost(message, tag = "11")]
        Satellites(super::SatelliteConfig),
    }
}
