//! Entidades referenciables y tablas de catálogo
//!
//! `EntityKind` es el único lugar donde se asocia una entidad con su tabla;
//! el verificador de existencia nunca recibe nombres de tabla libres.

/// Estado asignado a una mantención creada manualmente
pub const ESTADO_PENDIENTE: &str = "Pendiente";
/// Estado asignado a las mantenciones del lote periódico
pub const ESTADO_PROGRAMADA: &str = "Programada";
pub const ESTADO_EN_PROCESO: &str = "En Proceso";
/// Tipo asignado a las mantenciones del lote periódico
pub const TIPO_PREVENTIVA: &str = "Preventiva";
/// Clave de bitácora de las mantenciones programadas
pub const CLAVE_MANTENCION_PROGRAMADA: &str = "6-13";

/// Roles que pueden aprobar mantenciones y reciben sus notificaciones
pub const PRIVILEGED_ROLES: &[&str] = &["ADMINISTRADOR", "JEFE_MANTENCION", "SUPERVISOR"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Bitacora,
    Mantencion,
    Maquina,
    Taller,
    TipoMantencion,
    EstadoMantencion,
    Clave,
    Persona,
    Usuario,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Bitacora => "bitacora",
            EntityKind::Mantencion => "mantencion",
            EntityKind::Maquina => "maquina",
            EntityKind::Taller => "taller",
            EntityKind::TipoMantencion => "tipo_mantencion",
            EntityKind::EstadoMantencion => "estado_mantencion",
            EntityKind::Clave => "clave",
            EntityKind::Persona => "persona",
            EntityKind::Usuario => "usuario",
        }
    }

    /// Nombre legible usado en los mensajes de error
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Bitacora => "Bitácora",
            EntityKind::Mantencion => "Mantención",
            EntityKind::Maquina => "Máquina",
            EntityKind::Taller => "Taller",
            EntityKind::TipoMantencion => "Tipo de mantención",
            EntityKind::EstadoMantencion => "Estado de mantención",
            EntityKind::Clave => "Clave",
            EntityKind::Persona => "Persona",
            EntityKind::Usuario => "Usuario",
        }
    }

    pub fn missing_message(&self) -> String {
        format!("{} no existe o está eliminado", self.label())
    }
}

/// Tablas de catálogo que se consultan por nombre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupTable {
    EstadoMantencion,
    TipoMantencion,
    Clave,
}

impl LookupTable {
    pub fn entity(&self) -> EntityKind {
        match self {
            LookupTable::EstadoMantencion => EntityKind::EstadoMantencion,
            LookupTable::TipoMantencion => EntityKind::TipoMantencion,
            LookupTable::Clave => EntityKind::Clave,
        }
    }

    /// Columna que contiene el nombre buscado
    pub fn name_column(&self) -> &'static str {
        match self {
            LookupTable::Clave => "codigo",
            _ => "nombre",
        }
    }
}
