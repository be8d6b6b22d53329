//! User-facing copy for the onboarding widget, keyed by elapsed-time bucket.

use super::model::EvolutionStage;
use super::reminder::time_bucket;

pub fn stage_title(stage: EvolutionStage) -> &'static str {
    match stage {
        EvolutionStage::FirstRecharge => "Realiza tu primera recarga",
        EvolutionStage::NeedsVerification => "Verifica tu identidad",
        EvolutionStage::ProcessingDocs => "Procesando tus documentos",
        EvolutionStage::ReadyForBanking => "Valida tu cuenta bancaria",
        EvolutionStage::BankingValidated => "Cuenta completamente validada",
        EvolutionStage::FirstMobilePayment => "Validando tu pago móvil",
    }
}

/// Nudge shown while verification is outstanding, by hours since the last recharge.
pub fn verification_message(hours: f64, first_name: &str) -> String {
    match time_bucket(hours) {
        1 => format!(
            "⏰ {}, lleva 1 hora sin verificar. ¡Tu cuenta está esperando!",
            first_name
        ),
        3 => "📈 Han pasado 3 horas. El dólar sube, no pierdas valor en tu dinero".to_string(),
        6 => "💰 6 horas sin verificar. Tus fondos están seguros pero no productivos".to_string(),
        12 => format!(
            "🔔 {}, medio día sin verificar. ¡Activa todas las funciones!",
            first_name
        ),
        24 => "⚠️ 24 horas. Tus fondos esperan por ti, verifica para mayor seguridad".to_string(),
        _ => "🚀 Verifica ahora y desbloquea tu tarjeta virtual VISA".to_string(),
    }
}

/// Nudge shown while bank validation is outstanding, by hours since verification.
pub fn banking_message(hours: f64, first_name: &str, bank_name: Option<&str>) -> String {
    let bank = bank_name.unwrap_or("tu banco");
    match time_bucket(hours) {
        1 => format!("💳 {}, falta poco para retirar a {}", first_name, bank),
        3 => "📊 3 horas sin validar. El mercado se mueve, ¡no dejes tu dinero inmóvil!"
            .to_string(),
        6 => "🔐 Tus fondos están protegidos hasta que valides tu cuenta bancaria".to_string(),
        12 => format!("⭐ Estamos estableciendo conexión con {}...", bank),
        24 => format!(
            "🎯 24 horas esperando. {} está listo para recibir tu depósito",
            bank_name.unwrap_or("Tu banco")
        ),
        _ => "🏦 Valida tu cuenta bancaria y completa tu verificación".to_string(),
    }
}

pub fn first_recharge_message() -> &'static str {
    "💳 Recarga tu saldo para activar todas las funciones de tu cuenta"
}

pub fn mobile_payment_message() -> &'static str {
    "📱 Estamos validando tu pago móvil. Te notificaremos al finalizar"
}

pub fn banking_validated_message() -> &'static str {
    "✅ Tu cuenta está completamente activa"
}

/// Pre-filled support message for a rejected mobile payment.
pub fn rejected_payment_support_message(reference: &str) -> String {
    format!(
        "Necesito ayuda con mi pago móvil rechazado. Referencia: {}",
        reference
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_buckets() {
        assert!(verification_message(0.2, "Ana").starts_with("🚀"));
        assert!(verification_message(1.5, "Ana").contains("Ana, lleva 1 hora"));
        assert!(verification_message(30.0, "Ana").starts_with("⚠️ 24 horas"));
    }

    #[test]
    fn test_banking_message_uses_bank_name() {
        assert!(banking_message(1.0, "Ana", Some("Banesco")).contains("retirar a Banesco"));
        assert!(banking_message(12.0, "Ana", None).contains("tu banco"));
        assert!(banking_message(24.0, "Ana", None).contains("Tu banco está listo"));
    }
}
