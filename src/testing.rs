//! Dobles de prueba
//!
//! `InMemoryStore` implementa todos los repositorios sobre un estado en
//! memoria con los datos mínimos del flujo de mantenciones. Los
//! colaboradores externos graban lo que reciben y permiten inyectar fallas.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::clients::{ClientError, EmailMessage, Mailer, ObjectStorage, PdfRenderer, PdfRow, UploadedFile};
use crate::config::EnvironmentConfig;
use crate::models::alert::{
    Alert, AlertType, AudienceFilter, NotificationRecipient, PushPayload, UserAlertView,
};
use crate::models::catalog::{EntityKind, LookupTable, PRIVILEGED_ROLES};
use crate::models::logbook::{NewScheduledService, ScheduledPair};
use crate::models::maintenance::{
    Approval, InsertOutcome, MaintenanceChanges, MaintenanceRecord, NewMaintenance,
};
use crate::realtime::{LivePush, SessionRegistry};
use crate::repositories::{
    AlertRepository, CatalogRepository, ExistenceRepository, LogbookRepository,
    MaintenanceRepository, ScheduledBatch,
};
use crate::services::{AppServices, ServiceDeps, WorkflowCatalog};
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};

/// Catálogo que corresponde a `InMemoryStore::seeded()`
pub fn seeded_workflow() -> WorkflowCatalog {
    WorkflowCatalog {
        estado_pendiente: 2,
        estado_programada: 1,
        estado_en_proceso: 3,
        tipo_preventiva: 2,
        clave_programada: 10,
    }
}

#[derive(Debug, Clone)]
struct LookupRow {
    id: i32,
    nombre: String,
    estado: bool,
}

#[derive(Debug, Clone)]
struct Person {
    nombre: String,
    empresa_id: i32,
    rol: String,
    estado: bool,
}

#[derive(Debug, Clone)]
struct User {
    persona_id: i32,
    email: Option<String>,
    estado: bool,
}

#[derive(Debug, Clone)]
struct UserAlert {
    id: i32,
    alerta_id: i32,
    usuario_id: i32,
}

#[derive(Default)]
struct StoreState {
    next_id: i32,
    /// bitacora_id -> estado
    bitacoras: BTreeMap<i32, bool>,
    maquinas: BTreeMap<i32, (i32, bool)>,
    talleres: BTreeMap<i32, bool>,
    lookups: HashMap<LookupTable, Vec<LookupRow>>,
    personas: BTreeMap<i32, Person>,
    usuarios: BTreeMap<i32, User>,
    mantenciones: BTreeMap<i32, MaintenanceRecord>,
    /// (bitacora_id, estado)
    cargas_combustible: Vec<(i32, bool)>,
    alertas: Vec<Alert>,
    usuario_alertas: Vec<UserAlert>,
    scheduled_pairs: Vec<ScheduledPair>,
    deleted_pairs: Vec<i32>,
    pair_attempts: usize,
    fail_pair_at: Option<usize>,
    fail_pair_deletes: bool,
    fail_batch_commit: bool,
    fail_batch_rollback: bool,
    fail_alert_insert: bool,
}

impl StoreState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn lookup_active(&self, table: LookupTable, id: i32) -> bool {
        self.lookups
            .get(&table)
            .map(|rows| rows.iter().any(|r| r.id == id && r.estado))
            .unwrap_or(false)
    }
}

pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

fn lookup(id: i32, nombre: &str) -> LookupRow {
    LookupRow {
        id,
        nombre: nombre.to_string(),
        estado: true,
    }
}

fn person(nombre: &str, empresa_id: i32, rol: &str) -> Person {
    Person {
        nombre: nombre.to_string(),
        empresa_id,
        rol: rol.to_string(),
        estado: true,
    }
}

fn user(persona_id: i32, email: &str) -> User {
    User {
        persona_id,
        email: Some(email.to_string()),
        estado: true,
    }
}

fn injected(what: &str) -> AppError {
    AppError::Internal(format!("falla inyectada: {}", what))
}

impl InMemoryStore {
    /// Bitácora 42, máquina 7 de la empresa 1, taller 3, catálogo completo,
    /// una aprobadora (persona 5, usuario 20), un conductor (persona 6) y un
    /// jefe de mantención (persona 8); la persona 9 es de otra empresa.
    pub fn seeded() -> Self {
        let mut state = StoreState {
            next_id: 1000,
            ..Default::default()
        };

        state.bitacoras.insert(42, true);
        state.maquinas.insert(7, (1, true));
        state.talleres.insert(3, true);

        state.lookups.insert(
            LookupTable::TipoMantencion,
            vec![lookup(1, "Correctiva"), lookup(2, "Preventiva")],
        );
        state.lookups.insert(
            LookupTable::EstadoMantencion,
            vec![
                lookup(1, "Programada"),
                lookup(2, "Pendiente"),
                lookup(3, "En Proceso"),
                lookup(4, "Finalizada"),
            ],
        );
        state.lookups.insert(LookupTable::Clave, vec![lookup(10, "6-13")]);

        state.personas.insert(5, person("Ana Rojas", 1, "ADMINISTRADOR"));
        state.personas.insert(6, person("Pedro Soto", 1, "CONDUCTOR"));
        state.personas.insert(8, person("Jorge Díaz", 1, "JEFE_MANTENCION"));
        state.personas.insert(9, person("Marta Vidal", 2, "ADMINISTRADOR"));

        state.usuarios.insert(20, user(5, "ana@empresa.cl"));
        state.usuarios.insert(21, user(6, "pedro@empresa.cl"));
        state.usuarios.insert(22, user(8, "jorge@empresa.cl"));
        state.usuarios.insert(23, user(9, "marta@otra.cl"));

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    pub fn soft_delete_workshop(&self, id: i32) {
        self.state().talleres.insert(id, false);
    }

    pub fn remove_lookup(&self, table: LookupTable, name: &str) {
        if let Some(rows) = self.state().lookups.get_mut(&table) {
            rows.retain(|r| r.nombre != name);
        }
    }

    pub fn soft_delete_lookup(&self, kind: EntityKind, id: i32) {
        let table = match kind {
            EntityKind::EstadoMantencion => LookupTable::EstadoMantencion,
            EntityKind::TipoMantencion => LookupTable::TipoMantencion,
            EntityKind::Clave => LookupTable::Clave,
            other => panic!("{:?} no es una tabla de catálogo", other),
        };
        if let Some(rows) = self.state().lookups.get_mut(&table) {
            for row in rows.iter_mut().filter(|r| r.id == id) {
                row.estado = false;
            }
        }
    }

    pub fn add_person(&self, id: i32, empresa_id: i32) {
        self.state()
            .personas
            .insert(id, person("Persona de prueba", empresa_id, "CONDUCTOR"));
    }

    pub fn add_fuel_load(&self, bitacora_id: i32) {
        self.state().cargas_combustible.push((bitacora_id, true));
    }

    /// Inserta directamente una mantención pendiente sin aprobar
    pub fn insert_record(&self, bitacora_id: i32) -> MaintenanceRecord {
        let mut state = self.state();
        let id = state.next_id();
        let record = MaintenanceRecord {
            id,
            bitacora_id,
            maquina_id: 7,
            taller_id: 3,
            estado_mantencion_id: seeded_workflow().estado_pendiente,
            tipo_mantencion_id: 1,
            responsable_id: None,
            aprobador_id: None,
            fec_inicio: NaiveDate::from_ymd_opt(2024, 11, 4).unwrap(),
            fec_termino: None,
            ot: Some("OT-123".to_string()),
            num_factura: None,
            costo_servicio: None,
            imagen_url: None,
            descripcion: None,
            aprobada: false,
            fecha_aprobacion: None,
            estado: true,
        };
        state.mantenciones.insert(id, record.clone());
        record
    }

    /// Mantenciones no eliminadas
    pub fn maintenance_count(&self) -> usize {
        self.state().mantenciones.values().filter(|m| m.estado).count()
    }

    /// La n-ésima creación de par del lote (desde 1) falla
    pub fn fail_pair_at(&self, n: usize) {
        self.state().fail_pair_at = Some(n);
    }

    pub fn fail_pair_deletes(&self) {
        self.state().fail_pair_deletes = true;
    }

    /// El commit del lote se aplica pero informa error
    pub fn fail_batch_commit(&self) {
        self.state().fail_batch_commit = true;
    }

    pub fn fail_batch_rollback(&self) {
        self.state().fail_batch_rollback = true;
    }

    /// Ids de mantención de los pares eliminados, en orden de eliminación
    pub fn deleted_pairs(&self) -> Vec<i32> {
        self.state().deleted_pairs.clone()
    }

    pub fn live_scheduled_pairs(&self) -> usize {
        let state = self.state();
        state
            .scheduled_pairs
            .iter()
            .filter(|pair| {
                let logbook_live = state
                    .bitacoras
                    .get(&pair.bitacora_id)
                    .copied()
                    .unwrap_or(false);
                let record_live = state
                    .mantenciones
                    .get(&pair.mantencion_id)
                    .map(|m| m.estado)
                    .unwrap_or(false);
                logbook_live || record_live
            })
            .count()
    }

    pub fn fail_alert_insert(&self) {
        self.state().fail_alert_insert = true;
    }

    pub fn alert_count(&self) -> usize {
        self.state().alertas.len()
    }

    pub fn last_alert_content(&self) -> Option<String> {
        self.state().alertas.last().map(|a| a.contenido.clone())
    }

    /// Usuarios vinculados a una alerta, en orden de vinculación
    pub fn user_alert_links(&self, alerta_id: i32) -> Vec<i32> {
        self.state()
            .usuario_alertas
            .iter()
            .filter(|link| link.alerta_id == alerta_id)
            .map(|link| link.usuario_id)
            .collect()
    }
}

#[async_trait]
impl ExistenceRepository for InMemoryStore {
    async fn exists(&self, kind: EntityKind, id: i32) -> AppResult<bool> {
        let state = self.state();
        let exists = match kind {
            EntityKind::Bitacora => state.bitacoras.get(&id).copied().unwrap_or(false),
            EntityKind::Mantencion => state.mantenciones.get(&id).map(|m| m.estado).unwrap_or(false),
            EntityKind::Maquina => state.maquinas.get(&id).map(|m| m.1).unwrap_or(false),
            EntityKind::Taller => state.talleres.get(&id).copied().unwrap_or(false),
            EntityKind::TipoMantencion => state.lookup_active(LookupTable::TipoMantencion, id),
            EntityKind::EstadoMantencion => state.lookup_active(LookupTable::EstadoMantencion, id),
            EntityKind::Clave => state.lookup_active(LookupTable::Clave, id),
            EntityKind::Persona => state.personas.get(&id).map(|p| p.estado).unwrap_or(false),
            EntityKind::Usuario => state.usuarios.get(&id).map(|u| u.estado).unwrap_or(false),
        };
        Ok(exists)
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn find_id_by_name(&self, table: LookupTable, name: &str) -> AppResult<Option<i32>> {
        Ok(self.state().lookups.get(&table).and_then(|rows| {
            rows.iter()
                .find(|r| r.estado && r.nombre == name)
                .map(|r| r.id)
        }))
    }

    async fn machine_company(&self, maquina_id: i32) -> AppResult<Option<i32>> {
        Ok(self
            .state()
            .maquinas
            .get(&maquina_id)
            .filter(|(_, estado)| *estado)
            .map(|(empresa_id, _)| *empresa_id))
    }

    async fn person_in_company(&self, persona_id: i32, empresa_id: i32) -> AppResult<bool> {
        Ok(self
            .state()
            .personas
            .get(&persona_id)
            .map(|p| p.estado && p.empresa_id == empresa_id)
            .unwrap_or(false))
    }

    async fn privileged_person_name(&self, persona_id: i32) -> AppResult<Option<String>> {
        Ok(self
            .state()
            .personas
            .get(&persona_id)
            .filter(|p| p.estado && PRIVILEGED_ROLES.contains(&p.rol.as_str()))
            .map(|p| p.nombre.clone()))
    }

    async fn person_for_user(&self, usuario_id: i32) -> AppResult<Option<i32>> {
        Ok(self
            .state()
            .usuarios
            .get(&usuario_id)
            .filter(|u| u.estado)
            .map(|u| u.persona_id))
    }
}

#[async_trait]
impl MaintenanceRepository for InMemoryStore {
    async fn find_active(&self, id: i32) -> AppResult<Option<MaintenanceRecord>> {
        Ok(self.state().mantenciones.get(&id).filter(|m| m.estado).cloned())
    }

    async fn insert_guarded(&self, new: &NewMaintenance) -> AppResult<InsertOutcome> {
        let mut state = self.state();
        if !state.bitacoras.get(&new.bitacora_id).copied().unwrap_or(false) {
            return Ok(InsertOutcome::LogbookUnavailable);
        }

        let mantencion = state
            .mantenciones
            .values()
            .any(|m| m.estado && m.bitacora_id == new.bitacora_id);
        let combustible = state
            .cargas_combustible
            .iter()
            .any(|(bitacora_id, estado)| *estado && *bitacora_id == new.bitacora_id);
        if mantencion || combustible {
            return Ok(InsertOutcome::ActiveService {
                mantencion,
                combustible,
            });
        }

        let id = state.next_id();
        let record = MaintenanceRecord {
            id,
            bitacora_id: new.bitacora_id,
            maquina_id: new.maquina_id,
            taller_id: new.taller_id,
            estado_mantencion_id: new.estado_mantencion_id,
            tipo_mantencion_id: new.tipo_mantencion_id,
            responsable_id: None,
            aprobador_id: None,
            fec_inicio: new.fec_inicio,
            fec_termino: new.fec_termino,
            ot: Some(new.ot.clone()),
            num_factura: new.num_factura,
            costo_servicio: new.costo_servicio,
            imagen_url: new.imagen_url.clone(),
            descripcion: None,
            aprobada: false,
            fecha_aprobacion: None,
            estado: true,
        };
        state.mantenciones.insert(id, record.clone());
        Ok(InsertOutcome::Inserted(record))
    }

    async fn update_fields(
        &self,
        id: i32,
        changes: &MaintenanceChanges,
    ) -> AppResult<Option<MaintenanceRecord>> {
        let mut state = self.state();
        Ok(state
            .mantenciones
            .get_mut(&id)
            .filter(|m| m.estado)
            .map(|record| {
                *record = changes.apply_to(record);
                record.clone()
            }))
    }

    async fn set_approval(
        &self,
        id: i32,
        approval: Approval,
    ) -> AppResult<Option<MaintenanceRecord>> {
        let mut state = self.state();
        Ok(state
            .mantenciones
            .get_mut(&id)
            .filter(|m| m.estado)
            .map(|record| {
                record.aprobada = approval.aprobada;
                record.aprobador_id = approval.aprobador_id;
                record.fecha_aprobacion = approval.fecha_aprobacion;
                record.clone()
            }))
    }

    async fn set_state(
        &self,
        id: i32,
        estado_mantencion_id: i32,
    ) -> AppResult<Option<MaintenanceRecord>> {
        let mut state = self.state();
        Ok(state
            .mantenciones
            .get_mut(&id)
            .filter(|m| m.estado)
            .map(|record| {
                record.estado_mantencion_id = estado_mantencion_id;
                record.clone()
            }))
    }

    async fn soft_delete(&self, id: i32) -> AppResult<bool> {
        let mut state = self.state();
        match state.mantenciones.get_mut(&id).filter(|m| m.estado) {
            Some(record) => {
                record.estado = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Lote en memoria: los pares quedan pendientes hasta el commit
pub struct InMemoryBatch {
    state: Arc<Mutex<StoreState>>,
    pending: Vec<(ScheduledPair, NewScheduledService)>,
}

impl InMemoryBatch {
    fn apply(&self) {
        let mut state = self.state.lock().unwrap();
        for (pair, service) in &self.pending {
            state.bitacoras.insert(pair.bitacora_id, true);
            state.mantenciones.insert(
                pair.mantencion_id,
                MaintenanceRecord {
                    id: pair.mantencion_id,
                    bitacora_id: pair.bitacora_id,
                    maquina_id: service.maquina_id,
                    taller_id: service.taller_id,
                    estado_mantencion_id: service.estado_mantencion_id,
                    tipo_mantencion_id: service.tipo_mantencion_id,
                    responsable_id: Some(service.responsable_id),
                    aprobador_id: None,
                    fec_inicio: service.fec_inicio,
                    fec_termino: None,
                    ot: None,
                    num_factura: None,
                    costo_servicio: service.costo_estimado,
                    imagen_url: None,
                    descripcion: Some(service.descripcion.clone()),
                    aprobada: false,
                    fecha_aprobacion: None,
                    estado: true,
                },
            );
            state.scheduled_pairs.push(*pair);
        }
    }
}

#[async_trait]
impl ScheduledBatch for InMemoryBatch {
    async fn create_pair(&mut self, service: &NewScheduledService) -> AppResult<ScheduledPair> {
        let mut state = self.state.lock().unwrap();
        state.pair_attempts += 1;
        if state.fail_pair_at == Some(state.pair_attempts) {
            return Err(injected("creación de par"));
        }

        let pair = ScheduledPair {
            bitacora_id: state.next_id(),
            mantencion_id: state.next_id(),
            fec_inicio: service.fec_inicio,
        };
        self.pending.push((pair, service.clone()));
        Ok(pair)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.apply();
        if self.state.lock().unwrap().fail_batch_commit {
            return Err(injected("confirmación del lote"));
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        if self.state.lock().unwrap().fail_batch_rollback {
            return Err(injected("reversión del lote"));
        }
        Ok(())
    }
}

#[async_trait]
impl LogbookRepository for InMemoryStore {
    async fn begin_batch(&self) -> AppResult<Box<dyn ScheduledBatch>> {
        Ok(Box::new(InMemoryBatch {
            state: self.state.clone(),
            pending: Vec::new(),
        }))
    }

    async fn soft_delete_scheduled_service(&self, pair: &ScheduledPair) -> AppResult<()> {
        let mut state = self.state();
        if state.fail_pair_deletes {
            return Err(injected("eliminación de par"));
        }
        if let Some(record) = state.mantenciones.get_mut(&pair.mantencion_id) {
            record.estado = false;
        }
        if let Some(estado) = state.bitacoras.get_mut(&pair.bitacora_id) {
            *estado = false;
        }
        state.deleted_pairs.push(pair.mantencion_id);
        Ok(())
    }
}

#[async_trait]
impl AlertRepository for InMemoryStore {
    async fn insert_alert(&self, contenido: &str, tipo: AlertType) -> AppResult<Alert> {
        let mut state = self.state();
        if state.fail_alert_insert {
            return Err(injected("inserción de alerta"));
        }
        let alert = Alert {
            id: state.next_id(),
            contenido: contenido.to_string(),
            tipo: tipo.as_str().to_string(),
            created_at: Utc::now(),
            leida: false,
        };
        state.alertas.push(alert.clone());
        Ok(alert)
    }

    async fn link_user(&self, alerta_id: i32, usuario_id: i32) -> AppResult<()> {
        let mut state = self.state();
        let id = state.next_id();
        state.usuario_alertas.push(UserAlert {
            id,
            alerta_id,
            usuario_id,
        });
        Ok(())
    }

    async fn resolve_audience(&self, filter: &AudienceFilter) -> AppResult<Vec<NotificationRecipient>> {
        let state = self.state();
        Ok(state
            .usuarios
            .iter()
            .filter(|(_, u)| u.estado)
            .filter_map(|(usuario_id, u)| {
                let persona = state.personas.get(&u.persona_id).filter(|p| p.estado)?;
                let matches = filter.rol.as_ref().map(|r| *r == persona.rol).unwrap_or(true)
                    && filter.empresa_id.map(|e| e == persona.empresa_id).unwrap_or(true)
                    && (!filter.solo_privilegiados
                        || PRIVILEGED_ROLES.contains(&persona.rol.as_str()));
                matches.then(|| NotificationRecipient {
                    usuario_id: Some(*usuario_id),
                    email: u.email.clone(),
                    rol: persona.rol.clone(),
                    empresa_id: Some(persona.empresa_id),
                })
            })
            .collect())
    }

    async fn alerts_for_user(&self, usuario_id: i32) -> AppResult<Vec<UserAlertView>> {
        let state = self.state();
        let mut views: Vec<UserAlertView> = state
            .usuario_alertas
            .iter()
            .filter(|link| link.usuario_id == usuario_id)
            .filter_map(|link| {
                let alert = state.alertas.iter().find(|a| a.id == link.alerta_id)?;
                Some(UserAlertView {
                    usuario_alerta_id: link.id,
                    alerta_id: alert.id,
                    contenido: alert.contenido.clone(),
                    tipo: alert.tipo.clone(),
                    created_at: alert.created_at,
                    leida: alert.leida,
                })
            })
            .collect();
        views.reverse();
        Ok(views)
    }

    async fn mark_read(&self, alerta_id: i32) -> AppResult<bool> {
        let mut state = self.state();
        match state.alertas.iter_mut().find(|a| a.id == alerta_id) {
            Some(alert) => {
                alert.leida = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn client_failure(service: &'static str) -> ClientError {
    ClientError::Status {
        service,
        status: 500,
        body: "falla inyectada".to_string(),
    }
}

/// Mailer que graba los mensajes enviados
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failing: Mutex<HashSet<String>>,
    hanging: Mutex<HashSet<String>>,
}

impl RecordingMailer {
    pub fn fail_for(&self, email: &str) {
        self.failing.lock().unwrap().insert(email.to_string());
    }

    /// Los envíos a `email` no terminan nunca
    pub fn hang_for(&self, email: &str) {
        self.hanging.lock().unwrap().insert(email.to_string());
    }

    pub fn sent_to(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.to.clone()).collect()
    }

    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), ClientError> {
        let hangs = self.hanging.lock().unwrap().contains(&message.to);
        if hangs {
            std::future::pending::<()>().await;
        }
        if self.failing.lock().unwrap().contains(&message.to) {
            return Err(client_failure("mail"));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPush {
    pushed: Mutex<Vec<i32>>,
}

impl RecordingPush {
    pub fn pushed_to(&self) -> Vec<i32> {
        self.pushed.lock().unwrap().clone()
    }
}

#[async_trait]
impl LivePush for RecordingPush {
    async fn emit(&self, usuario_id: i32, _payload: &PushPayload) -> Result<usize, serde_json::Error> {
        self.pushed.lock().unwrap().push(usuario_id);
        Ok(1)
    }
}

#[derive(Default)]
pub struct FakePdfRenderer {
    rendered: Mutex<Vec<PdfRow>>,
    failing: AtomicBool,
}

impl FakePdfRenderer {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn rendered_rows(&self) -> Vec<PdfRow> {
        self.rendered.lock().unwrap().clone()
    }
}

#[async_trait]
impl PdfRenderer for FakePdfRenderer {
    async fn render(&self, _title: &str, rows: &[PdfRow]) -> Result<Vec<u8>, ClientError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(client_failure("pdf"));
        }
        self.rendered.lock().unwrap().extend(rows.iter().cloned());
        Ok(b"%PDF-1.4 prueba".to_vec())
    }
}

#[derive(Default)]
pub struct FakeStorage {
    failing: AtomicBool,
    failing_removes: AtomicBool,
    removed: Mutex<Vec<String>>,
}

impl FakeStorage {
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn fail_removes(&self) {
        self.failing_removes.store(true, Ordering::SeqCst);
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(&self, file: &UploadedFile) -> Result<String, ClientError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(client_failure("storage"));
        }
        Ok(format!("https://storage.test/{}", file.filename))
    }

    async fn remove(&self, url: &str) -> Result<(), ClientError> {
        if self.failing_removes.load(Ordering::SeqCst) {
            return Err(client_failure("storage"));
        }
        self.removed.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

pub fn test_config() -> EnvironmentConfig {
    EnvironmentConfig {
        environment: "test".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "postgres://localhost/flota_test".to_string(),
        db_max_connections: 1,
        cors_origins: Vec::new(),
        frontend_url: "https://flota.test".to_string(),
        mail_api_url: "https://mail.test/send".to_string(),
        mail_api_key: None,
        mail_from: "no-reply@flota.test".to_string(),
        pdf_render_url: "https://pdf.test/render".to_string(),
        storage_upload_url: "https://storage.test/upload".to_string(),
        storage_public_url: "https://storage.test".to_string(),
        notification_timeout: Duration::from_secs(5),
        log_json: false,
    }
}

/// Servicios completos sobre los dobles de prueba
pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub push: Arc<RecordingPush>,
    pub pdf: Arc<FakePdfRenderer>,
    pub storage: Arc<FakeStorage>,
    pub workflow: WorkflowCatalog,
    pub services: AppServices,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::seeded());
        let mailer = Arc::new(RecordingMailer::default());
        let push = Arc::new(RecordingPush::default());
        let pdf = Arc::new(FakePdfRenderer::default());
        let storage = Arc::new(FakeStorage::default());
        let workflow = seeded_workflow();

        let services = AppServices::new(
            ServiceDeps {
                existence: store.clone(),
                catalog: store.clone(),
                maintenance: store.clone(),
                logbooks: store.clone(),
                alerts: store.clone(),
                mailer: mailer.clone(),
                pdf: pdf.clone(),
                storage: storage.clone(),
                push: push.clone(),
                frontend_url: "https://flota.test".to_string(),
                notification_timeout: Duration::from_secs(5),
            },
            workflow,
        );

        Self {
            store,
            mailer,
            push,
            pdf,
            storage,
            workflow,
            services,
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(test_config(), self.services.clone(), SessionRegistry::new())
    }
}
