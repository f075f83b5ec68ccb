use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::connection::Endpoints;

/// Logical partition every visit is stored under.
pub const PARTITION_KEY: &str = "visit";

/// Public visit record, as exchanged over the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: String,
    pub user: String,
    pub information: String,
    pub local_ip: String,
    pub local_port: i32,
    pub remote_ip: String,
    pub remote_port: i32,
    pub creation_date: DateTime<Utc>,
}

impl Visit {
    /// Assemble a record from a request body and the endpoints observed on the
    /// current connection. The creation date is always "now", for updates too.
    pub fn from_request(id: String, request: VisitRequest, endpoints: &Endpoints) -> Self {
        Self {
            id,
            user: request.user,
            information: request.information,
            local_ip: endpoints.local_ip.clone(),
            local_port: endpoints.local_port,
            remote_ip: endpoints.remote_ip.clone(),
            remote_port: endpoints.remote_port,
            creation_date: Utc::now(),
        }
    }

    /// Same as [`Visit::from_request`] with a freshly generated id.
    pub fn new(request: VisitRequest, endpoints: &Endpoints) -> Self {
        Self::from_request(Uuid::new_v4().to_string(), request, endpoints)
    }
}

/// Body of `POST /visit` and `PUT /visit/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRequest {
    pub user: String,
    pub information: String,
}

/// Storage shape of a visit: the public fields plus the partition key, with
/// the visit id reused as the row key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VisitEntity {
    pub partition_key: String,
    #[serde(rename = "id")]
    pub row_key: String,
    pub user: String,
    pub information: String,
    pub local_ip: String,
    pub local_port: i32,
    pub remote_ip: String,
    pub remote_port: i32,
    pub creation_date: DateTime<Utc>,
}

impl From<&Visit> for VisitEntity {
    fn from(visit: &Visit) -> Self {
        Self {
            partition_key: PARTITION_KEY.to_string(),
            row_key: visit.id.clone(),
            user: visit.user.clone(),
            information: visit.information.clone(),
            local_ip: visit.local_ip.clone(),
            local_port: visit.local_port,
            remote_ip: visit.remote_ip.clone(),
            remote_port: visit.remote_port,
            creation_date: visit.creation_date,
        }
    }
}

impl From<VisitEntity> for Visit {
    fn from(entity: VisitEntity) -> Self {
        Self {
            id: entity.row_key,
            user: entity.user,
            information: entity.information,
            local_ip: entity.local_ip,
            local_port: entity.local_port,
            remote_ip: entity.remote_ip,
            remote_port: entity.remote_port,
            creation_date: entity.creation_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints {
            local_ip: "10.0.0.4".to_string(),
            local_port: 3000,
            remote_ip: "203.0.113.9".to_string(),
            remote_port: 51234,
        }
    }

    #[test]
    fn new_visit_gets_fresh_id_and_endpoints() {
        let request = VisitRequest {
            user: "alice".to_string(),
            information: "lab visit".to_string(),
        };
        let a = Visit::new(request.clone(), &endpoints());
        let b = Visit::new(request, &endpoints());

        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
        assert_eq!(a.remote_ip, "203.0.113.9");
        assert_eq!(a.local_port, 3000);
    }

    #[test]
    fn entity_uses_fixed_partition_and_id_as_row_key() {
        let visit = Visit::new(
            VisitRequest {
                user: "bob".to_string(),
                information: "delivery".to_string(),
            },
            &endpoints(),
        );
        let entity = VisitEntity::from(&visit);
        assert_eq!(entity.partition_key, "visit");
        assert_eq!(entity.row_key, visit.id);
        assert_eq!(Visit::from(entity), visit);
    }

    #[test]
    fn visit_serializes_with_camel_case_fields() {
        let visit = Visit::new(
            VisitRequest {
                user: "carol".to_string(),
                information: "audit".to_string(),
            },
            &endpoints(),
        );
        let json = serde_json::to_value(&visit).unwrap();
        for key in [
            "id",
            "user",
            "information",
            "localIp",
            "localPort",
            "remoteIp",
            "remotePort",
            "creationDate",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
