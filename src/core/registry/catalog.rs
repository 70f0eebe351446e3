//! Built-in catalog of the clinical-records schema
//!
//! Dependencies are derived from the foreign keys: every edge to another
//! registered table makes that table a dependency.

use super::{ForeignKeyEdge, SchemaRegistry, TableCategory, TableDefinition, EXTERNAL_IDENTITY};
use crate::domain::{RegistryError, TableName};
use std::collections::BTreeSet;

use TableCategory::*;

/// `(column, target table or EXTERNAL_IDENTITY, nullable)`
type Fk = (&'static str, &'static str, bool);

struct Entry {
    name: &'static str,
    label: &'static str,
    category: TableCategory,
    foreign_keys: &'static [Fk],
}

const EXT: &str = EXTERNAL_IDENTITY;

#[rustfmt::skip]
const CATALOG: &[Entry] = &[
    Entry { name: "organizations", label: "Organizaciones", category: Organization, foreign_keys: &[("owner_id", EXT, true)] },
    Entry { name: "branches", label: "Sucursales", category: Organization, foreign_keys: &[("organization_id", "organizations", false)] },
    Entry { name: "rooms", label: "Consultorios", category: Organization, foreign_keys: &[("branch_id", "branches", false)] },
    Entry { name: "roles", label: "Roles", category: Organization, foreign_keys: &[("organization_id", "organizations", false)] },
    Entry {
        name: "profiles",
        label: "Perfiles de usuario",
        category: Staff,
        foreign_keys: &[
            ("user_id", EXT, false),
            ("organization_id", "organizations", false),
            ("role_id", "roles", true),
            ("branch_id", "branches", true),
        ],
    },
    Entry { name: "specialties", label: "Especialidades", category: Catalog, foreign_keys: &[("organization_id", "organizations", false)] },
    Entry {
        name: "services",
        label: "Servicios",
        category: Catalog,
        foreign_keys: &[("organization_id", "organizations", false), ("specialty_id", "specialties", true)],
    },
    Entry { name: "medications", label: "Medicamentos", category: Catalog, foreign_keys: &[("organization_id", "organizations", false)] },
    Entry { name: "diagnosis_codes", label: "Códigos de diagnóstico", category: Catalog, foreign_keys: &[("organization_id", "organizations", true)] },
    Entry { name: "lab_tests", label: "Estudios de laboratorio", category: Catalog, foreign_keys: &[("organization_id", "organizations", false)] },
    Entry { name: "insurance_providers", label: "Aseguradoras", category: Catalog, foreign_keys: &[("organization_id", "organizations", false)] },
    Entry {
        name: "form_templates",
        label: "Plantillas de formularios",
        category: Catalog,
        foreign_keys: &[("organization_id", "organizations", false), ("created_by", EXT, true)],
    },
    Entry {
        name: "doctors",
        label: "Médicos",
        category: Staff,
        foreign_keys: &[
            ("profile_id", "profiles", false),
            ("specialty_id", "specialties", true),
            ("branch_id", "branches", true),
            ("user_id", EXT, true),
        ],
    },
    Entry {
        name: "staff_members",
        label: "Personal",
        category: Staff,
        foreign_keys: &[("profile_id", "profiles", false), ("branch_id", "branches", true), ("role_id", "roles", true)],
    },
    Entry {
        name: "doctor_schedules",
        label: "Horarios médicos",
        category: Scheduling,
        foreign_keys: &[("doctor_id", "doctors", false), ("branch_id", "branches", false), ("room_id", "rooms", true)],
    },
    Entry {
        name: "patients",
        label: "Pacientes",
        category: Patients,
        foreign_keys: &[
            ("organization_id", "organizations", false),
            ("branch_id", "branches", true),
            ("referred_by_patient_id", "patients", true),
            ("created_by", EXT, true),
        ],
    },
    Entry { name: "patient_contacts", label: "Contactos de pacientes", category: Patients, foreign_keys: &[("patient_id", "patients", false)] },
    Entry {
        name: "patient_insurances",
        label: "Seguros de pacientes",
        category: Patients,
        foreign_keys: &[("patient_id", "patients", false), ("insurance_provider_id", "insurance_providers", false)],
    },
    Entry {
        name: "patient_allergies",
        label: "Alergias",
        category: Patients,
        foreign_keys: &[("patient_id", "patients", false), ("recorded_by", EXT, true)],
    },
    Entry {
        name: "patient_conditions",
        label: "Padecimientos",
        category: Patients,
        foreign_keys: &[("patient_id", "patients", false), ("diagnosis_code_id", "diagnosis_codes", true)],
    },
    Entry {
        name: "patient_documents",
        label: "Documentos de pacientes",
        category: Patients,
        foreign_keys: &[("patient_id", "patients", false), ("uploaded_by", EXT, true)],
    },
    Entry {
        name: "appointments",
        label: "Citas",
        category: Scheduling,
        foreign_keys: &[
            ("patient_id", "patients", false),
            ("doctor_id", "doctors", false),
            ("branch_id", "branches", false),
            ("room_id", "rooms", true),
            ("service_id", "services", true),
            ("created_by", EXT, true),
        ],
    },
    Entry {
        name: "appointment_reminders",
        label: "Recordatorios de citas",
        category: Scheduling,
        foreign_keys: &[("appointment_id", "appointments", false)],
    },
    Entry {
        name: "waiting_list",
        label: "Lista de espera",
        category: Scheduling,
        foreign_keys: &[("patient_id", "patients", false), ("doctor_id", "doctors", true), ("service_id", "services", true)],
    },
    Entry {
        name: "encounters",
        label: "Consultas",
        category: Clinical,
        foreign_keys: &[
            ("patient_id", "patients", false),
            ("doctor_id", "doctors", false),
            ("appointment_id", "appointments", true),
            ("branch_id", "branches", true),
        ],
    },
    Entry {
        name: "vital_signs",
        label: "Signos vitales",
        category: Clinical,
        foreign_keys: &[("encounter_id", "encounters", false), ("patient_id", "patients", false), ("recorded_by", EXT, true)],
    },
    Entry {
        name: "diagnoses",
        label: "Diagnósticos",
        category: Clinical,
        foreign_keys: &[("encounter_id", "encounters", false), ("diagnosis_code_id", "diagnosis_codes", false)],
    },
    Entry {
        name: "prescriptions",
        label: "Recetas",
        category: Clinical,
        foreign_keys: &[("encounter_id", "encounters", false), ("patient_id", "patients", false), ("doctor_id", "doctors", false)],
    },
    Entry {
        name: "prescription_items",
        label: "Medicamentos recetados",
        category: Clinical,
        foreign_keys: &[("prescription_id", "prescriptions", false), ("medication_id", "medications", false)],
    },
    Entry {
        name: "lab_orders",
        label: "Órdenes de laboratorio",
        category: Clinical,
        foreign_keys: &[("encounter_id", "encounters", true), ("patient_id", "patients", false), ("doctor_id", "doctors", false)],
    },
    Entry {
        name: "lab_order_items",
        label: "Estudios ordenados",
        category: Clinical,
        foreign_keys: &[("lab_order_id", "lab_orders", false), ("lab_test_id", "lab_tests", false)],
    },
    Entry {
        name: "lab_results",
        label: "Resultados de laboratorio",
        category: Clinical,
        foreign_keys: &[("lab_order_item_id", "lab_order_items", false), ("validated_by", EXT, true)],
    },
    Entry {
        name: "clinical_notes",
        label: "Notas clínicas",
        category: Clinical,
        foreign_keys: &[("encounter_id", "encounters", false), ("author_id", EXT, false)],
    },
    Entry {
        name: "form_submissions",
        label: "Formularios respondidos",
        category: Clinical,
        foreign_keys: &[
            ("form_template_id", "form_templates", false),
            ("patient_id", "patients", false),
            ("encounter_id", "encounters", true),
            ("submitted_by", EXT, true),
        ],
    },
    Entry {
        name: "referrals",
        label: "Referencias",
        category: Clinical,
        foreign_keys: &[
            ("patient_id", "patients", false),
            ("from_doctor_id", "doctors", false),
            ("to_specialty_id", "specialties", true),
            ("encounter_id", "encounters", true),
        ],
    },
    Entry {
        name: "invoices",
        label: "Facturas",
        category: Billing,
        foreign_keys: &[("patient_id", "patients", false), ("branch_id", "branches", false), ("encounter_id", "encounters", true)],
    },
    Entry {
        name: "invoice_items",
        label: "Conceptos de factura",
        category: Billing,
        foreign_keys: &[("invoice_id", "invoices", false), ("service_id", "services", true)],
    },
    Entry {
        name: "payments",
        label: "Pagos",
        category: Billing,
        foreign_keys: &[("invoice_id", "invoices", false), ("received_by", EXT, true)],
    },
    Entry {
        name: "insurance_claims",
        label: "Reclamaciones a aseguradoras",
        category: Billing,
        foreign_keys: &[("invoice_id", "invoices", false), ("patient_insurance_id", "patient_insurances", false)],
    },
    Entry {
        name: "crm_leads",
        label: "Prospectos",
        category: Crm,
        foreign_keys: &[
            ("organization_id", "organizations", false),
            ("converted_patient_id", "patients", true),
            ("assigned_to", EXT, true),
        ],
    },
    Entry {
        name: "crm_campaigns",
        label: "Campañas",
        category: Crm,
        foreign_keys: &[("organization_id", "organizations", false), ("created_by", EXT, true)],
    },
    Entry {
        name: "crm_interactions",
        label: "Interacciones con prospectos",
        category: Crm,
        foreign_keys: &[
            ("lead_id", "crm_leads", false),
            ("campaign_id", "crm_campaigns", true),
            ("staff_member_id", "staff_members", true),
        ],
    },
    Entry {
        name: "notifications",
        label: "Notificaciones",
        category: System,
        foreign_keys: &[("user_id", EXT, false), ("organization_id", "organizations", false)],
    },
    Entry {
        name: "patient_messages",
        label: "Mensajes de pacientes",
        category: Patients,
        foreign_keys: &[("patient_id", "patients", false), ("sender_id", EXT, true)],
    },
    Entry {
        name: "audit_logs",
        label: "Bitácora de auditoría",
        category: System,
        foreign_keys: &[("user_id", EXT, true), ("organization_id", "organizations", true)],
    },
];

fn table_name(name: &str) -> Result<TableName, RegistryError> {
    TableName::new(name).map_err(RegistryError::InvalidTableName)
}

pub(super) fn clinical_registry() -> Result<SchemaRegistry, RegistryError> {
    let mut tables = Vec::with_capacity(CATALOG.len());
    let mut edges = Vec::new();

    for (position, entry) in CATALOG.iter().enumerate() {
        let name = table_name(entry.name)?;
        let mut dependencies = BTreeSet::new();

        for &(column, target, nullable) in entry.foreign_keys {
            if target == EXTERNAL_IDENTITY {
                edges.push(ForeignKeyEdge::to_external(name.clone(), column, nullable));
                continue;
            }
            let target = table_name(target)?;
            if target != name {
                dependencies.insert(target.clone());
            }
            edges.push(ForeignKeyEdge::to_table(name.clone(), column, target, "id", nullable));
        }

        tables.push(TableDefinition {
            name,
            label: entry.label.to_string(),
            category: entry.category,
            order: position as u32 + 1,
            dependencies,
        });
    }

    SchemaRegistry::new(tables, edges)
}
