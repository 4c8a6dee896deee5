//! Request dispatcher
//!
//! Maps one operator request onto the station and folds the outcome into a
//! response. Failures never escape: they travel back as `ErrorInfo`.

use crate::director::SlotLayout;
use crate::station::Station;
use skyfleet_shared::{
    request, response, DeviceList, Empty, FleetError, GpsPoint, InitDirector, LoraConfigReply,
    Request, Response, RtkConfigReply,
};
use tracing::{debug, warn};

/// Execute `request` against `station`
pub async fn dispatch(station: &Station, request: Request) -> Response {
    let request_id = request.request_id;

    let Some(body) = request.body else {
        let err = FleetError::Validation("request has no body".into());
        warn!("[CONTROL] Request {} rejected: {}", request_id, err);
        return Response::failed(request_id, &err);
    };

    debug!("[CONTROL] Request {}: {}", request_id, operation_name(&body));
    match execute(station, body).await {
        Ok(body) => Response::ok(request_id, body),
        Err(e) => {
            warn!("[CONTROL] Request {} failed: {}", request_id, e);
            Response::failed(request_id, &e)
        }
    }
}

async fn execute(station: &Station, body: request::Body) -> Result<response::Body, FleetError> {
    use request::Body as Req;
    use response::Body as Resp;

    let done = || Resp::Done(Empty {});

    match body {
        // Director
        Req::InitDirector(init) => {
            let (origin, layout) = init_params(&init)?;
            station
                .director
                .lock()
                .await
                .init(origin, layout, init.heading, init.height)?;
            Ok(done())
        }
        Req::DestroyDirector(_) => {
            station.director.lock().await.destroy();
            Ok(done())
        }
        Req::Assign(assign) => {
            let mut director = station.director.lock().await;
            director.assign(assign.drone_id).await?;
            Ok(Resp::Director(director.poll_status()))
        }
        Req::CheckAssign(_) => {
            let report = station.director.lock().await.check_assign().await?;
            Ok(Resp::Check(report))
        }
        Req::TransferAssign(_) => {
            let report = station.director.lock().await.transfer_assign()?;
            Ok(Resp::MultiOp(report))
        }
        Req::CancelAssign(_) => {
            let report = station.director.lock().await.cancel_assign().await?;
            Ok(Resp::MultiOp(report))
        }
        Req::PollDirector(_) => Ok(Resp::Director(station.director.lock().await.poll_status())),
        Req::MarkUnused(mark) => {
            station.director.lock().await.mark_unused(mark.slot_index)?;
            Ok(done())
        }

        // Fleet-wide actions
        Req::DroneAction(request) => {
            let report = station
                .fleet
                .perform(request.action(), &request.drone_ids)
                .await?;
            Ok(Resp::MultiOp(report))
        }
        Req::ChangeMode(request) => {
            let report = station
                .fleet
                .change_mode(request.mode, &request.drone_ids)
                .await?;
            Ok(Resp::MultiOp(report))
        }

        // Radio link
        Req::ConnectLora(config) => {
            station.lora.lock().await.connect(config).await?;
            Ok(done())
        }
        Req::DisconnectLora(_) => {
            station.lora.lock().await.disconnect().await?;
            Ok(done())
        }
        Req::QueryLora(_) => Ok(Resp::Lora(LoraConfigReply {
            config: station.lora.lock().await.current_config(),
        })),

        // RTK base station
        Req::ConnectRtk(config) => {
            station.rtk.lock().await.connect(config).await?;
            Ok(done())
        }
        Req::DisconnectRtk(_) => {
            station.rtk.lock().await.disconnect().await?;
            Ok(done())
        }
        Req::QueryRtk(_) => Ok(Resp::Rtk(RtkConfigReply {
            config: station.rtk.lock().await.current_config(),
        })),
        Req::RtkStatus(_) => Ok(Resp::RtkInfo(station.rtk.lock().await.info().await)),
        Req::GetSatellites(_) => Ok(Resp::Satellites(station.rtk.lock().await.satellites())),
        Req::UpdateSatellites(config) => {
            let applied = station.rtk.lock().await.update_satellites(config)?;
            Ok(Resp::Satellites(applied))
        }

        Req::ListDevices(_) => Ok(Resp::Devices(DeviceList {
            devices: station.available_devices().await?,
        })),
    }
}

/// Origin and slot layout of an init request
fn init_params(init: &InitDirector) -> Result<(GpsPoint, SlotLayout), FleetError> {
    let origin = init
        .origin
        .ok_or_else(|| FleetError::Validation("origin is required".into()))?;

    let layout = match (init.relative_slots.is_empty(), init.absolute_slots.is_empty()) {
        (false, false) => {
            return Err(FleetError::Validation(
                "give either relative or absolute slots, not both".into(),
            ))
        }
        (true, false) => SlotLayout::Absolute(init.absolute_slots.clone()),
        _ => SlotLayout::Relative(init.relative_slots.clone()),
    };
    Ok((origin, layout))
}

fn operation_name(body: &request::Body) -> &'static str {
    use request::Body as Req;
    match body {
        Req::InitDirector(_) => "init_director",
        Req::DestroyDirector(_) => "destroy_director",
        Req::Assign(_) => "assign",
        Req::CheckAssign(_) => "check_assign",
        Req::TransferAssign(_) => "transfer_assign",
        Req::CancelAssign(_) => "cancel_assign",
        Req::PollDirector(_) => "poll_director",
        Req::MarkUnused(_) => "mark_unused",
        Req::DroneAction(_) => "drone_action",
        Req::ChangeMode(_) => "change_mode",
        Req::ConnectLora(_) => "connect_lora",
        Req::DisconnectLora(_) => "disconnect_lora",
        Req::QueryLora(_) => "query_lora",
        Req::ConnectRtk(_) => "connect_rtk",
        Req::DisconnectRtk(_) => "disconnect_rtk",
        Req::QueryRtk(_) => "query_rtk",
        Req::RtkStatus(_) => "rtk_status",
        Req::ListDevices(_) => "list_devices",
        Req::GetSatellites(_) => "get_satellites",
        Req::UpdateSatellites(_) => "update_satellites",
    }
}
