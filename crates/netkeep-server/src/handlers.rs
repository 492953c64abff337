// ── Route handlers ──
//
// The active site is a request parameter (the `x-netkeep-site` header),
// never engine state: every handler resolves it first and passes the
// site id down. Reconciliation runs as a best-effort follow-up to
// device mutations -- a reconciliation failure is logged and the device
// response is unchanged.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::warn;

use netkeep_core::addr;
use netkeep_core::model::{
    ChangeAction, Device, DeviceState, EntityId, IpAddress, IpStatus, MacAddress, NetworkRole,
    Site, Subnet, Vlan, VlanStatus,
};
use netkeep_core::utilization::utilization_for;
use netkeep_core::CoreError;

use crate::dto::{
    ApiError, CreateDeviceRequest, CreateIpAddressRequest, CreateSubnetRequest, CreateVlanRequest,
    DashboardResponse, ImportResponse, SubnetResponse, SubnetUtilizationRow, SuccessResponse,
    UpdateDeviceRequest,
};
use crate::state::AppState;

/// Header carrying the caller's active site slug.
pub const SITE_HEADER: &str = "x-netkeep-site";

type Rejection = (StatusCode, Json<ApiError>);
type ApiResult<T> = Result<T, Rejection>;

// ── Shared helpers ──────────────────────────────────────────────────

fn no_active_site() -> Rejection {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiError::new("No active site")),
    )
}

fn active_site(state: &AppState, headers: &HeaderMap) -> ApiResult<Site> {
    let slug = headers
        .get(SITE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(no_active_site)?;
    state.store.site_by_slug(slug).ok_or_else(no_active_site)
}

/// Map a core error to an HTTP response. Storage internals never leak.
fn error_response(err: CoreError) -> Rejection {
    let status = match &err {
        CoreError::InvalidAddress { .. }
        | CoreError::InvalidSnapshot { .. }
        | CoreError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::Conflict { .. } => StatusCode::CONFLICT,
        CoreError::StorageTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        CoreError::Storage { .. } => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new("internal storage error")),
            );
        }
    };
    (status, Json(ApiError::new(err.to_string())))
}

fn store_error(err: netkeep_core::store::StoreError) -> Rejection {
    error_response(CoreError::from(err))
}

fn validation(message: impl Into<String>) -> Rejection {
    error_response(CoreError::ValidationFailed {
        message: message.into(),
    })
}

fn parse_id(entity: &'static str, raw: &str) -> ApiResult<EntityId> {
    raw.parse::<EntityId>().map_err(|_| {
        error_response(CoreError::NotFound {
            entity,
            identifier: raw.to_owned(),
        })
    })
}

// ── Backup ──────────────────────────────────────────────────────────

pub async fn export_backup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let site = active_site(&state, &headers)?;
    let snapshot = state.exporter.export(&site.slug).map_err(error_response)?;
    let filename = format!(
        "{}-backup-{}.json",
        site.slug,
        snapshot.exported_at.format("%Y-%m-%d")
    );
    Ok((
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )],
        Json(snapshot),
    ))
}

pub async fn import_backup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(document): Json<serde_json::Value>,
) -> ApiResult<Json<ImportResponse>> {
    let site = active_site(&state, &headers)?;
    match state.importer.import(&site.slug, document) {
        Ok(counts) => Ok(Json(ImportResponse {
            success: true,
            counts,
        })),
        Err(err @ (CoreError::InvalidSnapshot { .. } | CoreError::Conflict { .. })) => {
            Err(error_response(err))
        }
        // Import is the one place the underlying message is included:
        // the caller needs it to recover from a failed restore.
        Err(err) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(format!("Failed to import backup: {err}"))),
        )),
    }
}

// ── Devices ─────────────────────────────────────────────────────────

pub async fn list_devices(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Device>>> {
    let site = active_site(&state, &headers)?;
    Ok(Json(state.store.devices_for_site(site.id)))
}

pub async fn create_device(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateDeviceRequest>,
) -> ApiResult<Json<Device>> {
    let site = active_site(&state, &headers)?;
    if req.name.trim().is_empty() {
        return Err(validation("device name must not be empty"));
    }

    let device = state
        .store
        .transact(|tx| {
            let created = tx.insert_device(Device {
                id: EntityId::new(),
                site_id: site.id,
                name: req.name.clone(),
                mac: req.mac_address.as_deref().map(MacAddress::new),
                ip_address: req.ip_address.clone(),
                category: req.category.clone(),
                status: req.status.unwrap_or(DeviceState::Active),
                location: req.location.clone(),
                notes: req.notes.clone(),
            })?;
            tx.append_change(
                site.id,
                "device",
                &created.id.to_string(),
                ChangeAction::Created,
                json!({"name": created.name, "ipAddress": created.ip_address}),
            )?;
            Ok(created)
        })
        .map_err(store_error)?;

    if let Err(err) = state.reconciler.device_created(&device) {
        warn!(device = %device.name, %err, "reconciliation after device create failed");
    }
    Ok(Json(device))
}

pub async fn update_device(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateDeviceRequest>,
) -> ApiResult<Json<Device>> {
    let site = active_site(&state, &headers)?;
    let id = parse_id("device", &id)?;
    let old = state
        .store
        .device(id)
        .filter(|d| d.site_id == site.id)
        .ok_or_else(|| error_response(CoreError::not_found("device", id.to_string())))?;

    let mut updated = old.clone();
    if let Some(name) = req.name {
        updated.name = name;
    }
    if let Some(mac) = req.mac_address {
        updated.mac = Some(MacAddress::new(mac));
    }
    if let Some(ip) = req.ip_address {
        updated.ip_address = ip;
    }
    if let Some(category) = req.category {
        updated.category = Some(category);
    }
    if let Some(status) = req.status {
        updated.status = status;
    }
    if let Some(location) = req.location {
        updated.location = Some(location);
    }
    if let Some(notes) = req.notes {
        updated.notes = Some(notes);
    }

    state
        .store
        .transact(|tx| {
            tx.update_device(updated.clone())?;
            tx.append_change(
                site.id,
                "device",
                &updated.id.to_string(),
                ChangeAction::Updated,
                json!({"name": updated.name, "ipAddress": updated.ip_address}),
            )?;
            Ok(())
        })
        .map_err(store_error)?;

    if let Err(err) = state
        .reconciler
        .device_updated(&updated, &old.ip_address, &updated.ip_address)
    {
        warn!(device = %updated.name, %err, "reconciliation after device update failed");
    }
    Ok(Json(updated))
}

pub async fn delete_device(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let site = active_site(&state, &headers)?;
    let id = parse_id("device", &id)?;
    let device = state
        .store
        .device(id)
        .filter(|d| d.site_id == site.id)
        .ok_or_else(|| error_response(CoreError::not_found("device", id.to_string())))?;

    state
        .store
        .transact(|tx| {
            for service in tx.services_for_device(id) {
                tx.delete_service(service.id)?;
            }
            tx.delete_device(id)?;
            tx.append_change(
                site.id,
                "device",
                &id.to_string(),
                ChangeAction::Deleted,
                json!({"name": device.name}),
            )?;
            Ok(())
        })
        .map_err(store_error)?;

    if let Err(err) = state.reconciler.device_deleted(&device) {
        warn!(device = %device.name, %err, "reconciliation after device delete failed");
    }
    Ok(Json(SuccessResponse::ok()))
}

// ── VLANs ───────────────────────────────────────────────────────────

pub async fn create_vlan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateVlanRequest>,
) -> ApiResult<Json<Vlan>> {
    let site = active_site(&state, &headers)?;
    let vlan = state
        .store
        .transact(|tx| {
            let created = tx.insert_vlan(Vlan {
                id: EntityId::new(),
                site_id: site.id,
                vid: req.vid,
                name: req.name.clone(),
                role: req.role.unwrap_or(NetworkRole::Lan),
                status: req.status.unwrap_or(VlanStatus::Active),
            })?;
            tx.append_change(
                site.id,
                "vlan",
                &created.id.to_string(),
                ChangeAction::Created,
                json!({"vid": created.vid, "name": created.name}),
            )?;
            Ok(created)
        })
        .map_err(store_error)?;
    Ok(Json(vlan))
}

// ── Subnets ─────────────────────────────────────────────────────────

pub async fn list_subnets(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<SubnetResponse>>> {
    let site = active_site(&state, &headers)?;
    let rows = state.store.read(|s| {
        let devices = s.devices_for_site(site.id);
        s.subnets_for_site(site.id)
            .into_iter()
            .map(|subnet| {
                let addresses = s.ip_addresses_for_subnet(subnet.id);
                let util = utilization_for(&subnet, &addresses, &devices);
                SubnetResponse {
                    id: subnet.id.to_string(),
                    cidr: subnet.cidr(),
                    prefix: subnet.prefix,
                    mask: subnet.mask,
                    vlan_id: subnet.vlan_id.map(|v| v.to_string()),
                    gateway: subnet.gateway,
                    role: subnet.role,
                    status: subnet.status,
                    total_ips: util.total_ips,
                    used_ips: util.used_ips,
                    utilization: util.pct,
                }
            })
            .collect()
    });
    Ok(Json(rows))
}

pub async fn create_subnet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateSubnetRequest>,
) -> ApiResult<Json<Subnet>> {
    let site = active_site(&state, &headers)?;
    if req.mask > 32 {
        return Err(validation(format!("mask /{} out of range", req.mask)));
    }
    addr::to_int(&req.prefix).map_err(error_response)?;
    let vlan_id = match &req.vlan_id {
        Some(raw) => Some(
            raw.parse::<EntityId>()
                .map_err(|_| validation(format!("invalid vlan id: {raw}")))?,
        ),
        None => None,
    };

    let subnet = state
        .store
        .transact(|tx| {
            let created = tx.insert_subnet(Subnet {
                id: EntityId::new(),
                site_id: site.id,
                vlan_id,
                prefix: req.prefix.clone(),
                mask: req.mask,
                gateway: req.gateway.clone(),
                role: req.role.unwrap_or(NetworkRole::Lan),
                status: req.status.unwrap_or(VlanStatus::Active),
            })?;
            tx.append_change(
                site.id,
                "subnet",
                &created.id.to_string(),
                ChangeAction::Created,
                json!({"cidr": created.cidr()}),
            )?;
            Ok(created)
        })
        .map_err(store_error)?;
    Ok(Json(subnet))
}

pub async fn delete_subnet(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let site = active_site(&state, &headers)?;
    let id = parse_id("subnet", &id)?;
    state
        .reconciler
        .subnet_deleted(site.id, id)
        .map_err(error_response)?;
    state
        .store
        .transact(|tx| {
            tx.append_change(
                site.id,
                "subnet",
                &id.to_string(),
                ChangeAction::Deleted,
                json!({}),
            )
        })
        .map_err(store_error)?;
    Ok(Json(SuccessResponse::ok()))
}

// ── IP addresses ────────────────────────────────────────────────────

pub async fn create_ip_address(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateIpAddressRequest>,
) -> ApiResult<Json<IpAddress>> {
    let site = active_site(&state, &headers)?;
    let subnet_id = parse_id("subnet", &req.subnet_id)?;
    let subnet = state
        .store
        .read(|s| s.subnet(subnet_id).cloned())
        .filter(|s| s.site_id == site.id)
        .ok_or_else(|| error_response(CoreError::not_found("subnet", req.subnet_id.clone())))?;

    // Explicit address CRUD surfaces parse failures as validation errors.
    addr::to_int(&req.address).map_err(error_response)?;
    if !addr::belongs_to_subnet(&req.address, &subnet.prefix, subnet.mask)
        .map_err(error_response)?
    {
        return Err(validation(format!(
            "address {} is not inside {}",
            req.address,
            subnet.cidr()
        )));
    }

    let record = state
        .store
        .transact(|tx| {
            let created = tx.insert_ip_address(IpAddress {
                id: EntityId::new(),
                site_id: site.id,
                subnet_id,
                address: req.address.clone(),
                mask: subnet.mask,
                status: req.status.unwrap_or(IpStatus::Active),
                assigned_to: req.assigned_to.clone(),
                dns_name: req.dns_name.clone(),
                description: req.description.clone(),
            })?;
            tx.append_change(
                site.id,
                "ip_address",
                &created.id.to_string(),
                ChangeAction::Created,
                json!({"address": created.address}),
            )?;
            Ok(created)
        })
        .map_err(store_error)?;
    Ok(Json(record))
}

pub async fn delete_ip_address(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let site = active_site(&state, &headers)?;
    let id = parse_id("ip_address", &id)?;
    let removed = state
        .reconciler
        .ip_address_deleted(site.id, id)
        .map_err(error_response)?;
    state
        .store
        .transact(|tx| {
            tx.append_change(
                site.id,
                "ip_address",
                &id.to_string(),
                ChangeAction::Deleted,
                json!({"address": removed.address}),
            )
        })
        .map_err(store_error)?;
    Ok(Json(SuccessResponse::ok()))
}

// ── Dashboard ───────────────────────────────────────────────────────

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<DashboardResponse>> {
    let site = active_site(&state, &headers)?;
    let response = state.store.read(|s| {
        let devices = s.devices_for_site(site.id);
        let subnets = s.subnets_for_site(site.id);
        let subnet_utilization = subnets
            .iter()
            .map(|subnet| {
                let addresses = s.ip_addresses_for_subnet(subnet.id);
                let util = utilization_for(subnet, &addresses, &devices);
                SubnetUtilizationRow {
                    id: subnet.id.to_string(),
                    cidr: subnet.cidr(),
                    total_ips: util.total_ips,
                    used_ips: util.used_ips,
                    utilization: util.pct,
                }
            })
            .collect();
        DashboardResponse {
            devices: devices.len(),
            subnets: subnets.len(),
            vlans: s.vlans_for_site(site.id).len(),
            wifi_networks: s.wifi_networks_for_site(site.id).len(),
            services: s.services_for_site(site.id).len(),
            ip_addresses: s.ip_addresses_for_site(site.id).len(),
            subnet_utilization,
        }
    });
    Ok(Json(response))
}
