// SPDX-FileCopyrightText: 2026 Relato Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing strings and control phrases.
//!
//! The bot speaks Portuguese; the two control phrases double as labels on
//! the persistent quick-action keyboard.

/// Quick-action phrase that starts a new registration dialogue.
pub const NEW_ACTIVITY_PHRASE: &str = "🆕 Novo registro";

/// Quick-action phrase that lists recent registrations.
pub const LIST_PHRASE: &str = "📋 Ver registros";

pub const GREETING: &str = "Olá! Use os botões abaixo para criar ou consultar registros.";

pub const HELP: &str = "Envie um texto para iniciar um registro, ou responda a um registro \
existente para adicionar notas e fotos. Use \"🆕 Novo registro\" para começar e \
\"📋 Ver registros\" para listar os mais recentes.";

pub const SEED_PROMPT: &str = "📝 Envie o texto do registro:";

pub const SEED_PROMPT_REPEAT: &str = "📝 Ainda aguardando o texto do registro. Envie quando quiser.";

pub const CHOICE_PROMPT: &str = "Deseja registrar apenas o texto ou vai enviar uma foto?";

pub const NOTE_APPENDED: &str = "📝 Nota adicionada ao registro.";

pub const PHOTO_APPENDED: &str = "📷 Foto adicionada ao registro.";

pub const PHOTO_WAIT_EXPIRED: &str = "⏰ Tempo esgotado: o registro foi salvo sem foto.";

pub const HELD_TEXT_MISSING: &str =
    "⚠️ Não encontrei o texto desse registro. Envie o texto novamente, por favor.";

pub const ACTIVITY_MISSING: &str =
    "⚠️ Esse registro não existe mais. Envie a mensagem novamente, por favor.";

pub const GENERIC_FAILURE: &str = "❌ Algo deu errado ao salvar. Tente novamente.";

pub const NO_ACTIVITIES: &str = "Nenhum registro ainda. Use \"🆕 Novo registro\" para criar o primeiro.";

/// Confirmation after a plain-text registration.
pub fn registered_text(activity: &relato_core::ActivityId) -> String {
    format!("✅ Registro criado: {activity}")
}

/// Confirmation after registering with an open photo wait.
pub fn registered_awaiting_photo(activity: &relato_core::ActivityId, window_secs: u64) -> String {
    format!("✅ Registro criado: {activity}\n📷 Aguardando a foto por até {window_secs}s.")
}

/// Confirmation after a photo created a brand-new registration.
pub fn registered_photo(activity: &relato_core::ActivityId) -> String {
    format!("✅ Foto registrada em um novo registro: {activity}")
}
