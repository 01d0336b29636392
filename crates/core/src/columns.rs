//! Table columns per record kind and cell rendering.
//!
//! This module provides:
//! - Column specs (labels, widths, kinds) for each list page
//! - A renderer producing the display text of a record in a given column

#![forbid(unsafe_code)]

use crate::validation::ValidationState;
use crate::{Health, Record, RecordKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Namespace,
    Name,
    IstioSidecar,
    Health,
    WorkloadType,
    AppLabel,
    VersionLabel,
    IstioType,
    Validation,
    Mtls,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    pub label: &'static str,
    pub width: usize,
}

fn col(kind: ColumnKind, label: &'static str, width: usize) -> ColumnSpec {
    ColumnSpec { kind, label, width }
}

/// Full column set for a list page.
pub fn columns_for(kind: RecordKind) -> Vec<ColumnSpec> {
    let mut cols: Vec<ColumnSpec> = Vec::new();
    if kind != RecordKind::Namespace {
        cols.push(col(ColumnKind::Namespace, "Namespace", 18));
    }
    cols.push(col(ColumnKind::Name, "Name", 32));

    match kind {
        RecordKind::Service | RecordKind::App => {
            cols.push(col(ColumnKind::IstioSidecar, "Sidecar", 8));
            cols.push(col(ColumnKind::Health, "Health", 22));
        }
        RecordKind::Workload => {
            cols.push(col(ColumnKind::WorkloadType, "Type", 18));
            cols.push(col(ColumnKind::IstioSidecar, "Sidecar", 8));
            cols.push(col(ColumnKind::AppLabel, "App", 4));
            cols.push(col(ColumnKind::VersionLabel, "Version", 8));
            cols.push(col(ColumnKind::Health, "Health", 22));
        }
        RecordKind::IstioConfig => {
            cols.push(col(ColumnKind::IstioType, "Type", 24));
            cols.push(col(ColumnKind::Validation, "Config", 14));
        }
        RecordKind::Namespace => {
            cols.push(col(ColumnKind::Health, "Status", 22));
            cols.push(col(ColumnKind::Mtls, "mTLS", 24));
        }
    }
    cols
}

fn yes_no(b: bool) -> String {
    if b { "Y".into() } else { "N".into() }
}

fn health_cell(h: Option<&Health>) -> String {
    match h {
        Some(h) => {
            let errors = h.errors();
            if errors.value >= 0.0 {
                format!("{} ({:.1}%)", h.global_status().name(), errors.value)
            } else {
                h.global_status().name().to_string()
            }
        }
        None => "-".into(),
    }
}

/// Render the text of `record` in column `kind`; `-` when not applicable.
pub fn render_cell(record: &Record, kind: ColumnKind) -> String {
    match (kind, record) {
        (ColumnKind::Namespace, r) => r.namespace().to_string(),
        (ColumnKind::Name, r) => r.name().to_string(),
        (ColumnKind::IstioSidecar, Record::Service(s)) => yes_no(s.istio_sidecar),
        (ColumnKind::IstioSidecar, Record::Workload(w)) => yes_no(w.istio_sidecar),
        (ColumnKind::IstioSidecar, Record::App(a)) => yes_no(a.istio_sidecar),
        (ColumnKind::Health, Record::Service(s)) => health_cell(s.health.as_ref()),
        (ColumnKind::Health, Record::Workload(w)) => health_cell(w.health.as_ref()),
        (ColumnKind::Health, Record::App(a)) => health_cell(a.health.as_ref()),
        (ColumnKind::Health, Record::Namespace(n)) => match &n.status {
            Some(st) => format!(
                "{} err / {} warn / {} ok",
                st.in_error.len(),
                st.in_warning.len(),
                st.in_success.len()
            ),
            None => "-".into(),
        },
        (ColumnKind::WorkloadType, Record::Workload(w)) => w.workload_type.clone(),
        (ColumnKind::AppLabel, Record::Workload(w)) => yes_no(w.app_label),
        (ColumnKind::VersionLabel, Record::Workload(w)) => yes_no(w.version_label),
        (ColumnKind::IstioType, Record::IstioConfig(c)) => match &c.sub_kind {
            Some(sub) => format!("{} ({})", c.kind, sub),
            None => c.kind.clone(),
        },
        (ColumnKind::Validation, Record::IstioConfig(c)) => {
            ValidationState::of(c.validation.as_ref()).id().to_string()
        }
        (ColumnKind::Mtls, Record::Namespace(n)) => {
            n.tls_status.as_ref().map(|t| t.status.clone()).unwrap_or_else(|| "-".into())
        }
        _ => "-".into(),
    }
}
