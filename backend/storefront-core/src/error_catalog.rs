//! Storefront error codes and their user-facing messages.
//!
//! Codes follow a six digit scheme: the leading three digits are the HTTP
//! status class the server answered with (`4xxxxx` client, `5xxxxx` server),
//! the trailing three number the individual failure. `450001`-`450003` are
//! raised by this crate itself before a request leaves the client.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

/// Codes raised locally by input validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    BalanceNotANumber,
    TopupAmountNotANumber,
    WithdrawAmountNotANumber,
}

impl ErrorCode {
    pub const fn as_u32(self) -> u32 {
        match self {
            ErrorCode::BalanceNotANumber => 450001,
            ErrorCode::TopupAmountNotANumber => 450002,
            ErrorCode::WithdrawAmountNotANumber => 450003,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Server codes the token lifecycle reacts to.
pub mod codes {
    pub const INVALID_TOKEN: u32 = 401002;
    pub const TOKEN_EXPIRED: u32 = 401003;
    pub const INVALID_TOKEN_SIGNATURE: u32 = 401006;
    pub const REFRESH_TOKEN_USER_MISMATCH: u32 = 401008;
    pub const REFRESH_TOKEN_INVALID: u32 = 401009;
}

/// Broad class of an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Client,
    Server,
    Unknown,
}

pub fn classify(code: u32) -> ErrorClass {
    match code / 100_000 {
        4 => ErrorClass::Client,
        5 => ErrorClass::Server,
        _ => ErrorClass::Unknown,
    }
}

static TRANSLATIONS: Lazy<HashMap<u32, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (400001, "Fehlender Request Parameter"),
        (400002, "Anfrage konnte nicht zugewiesen werden"),
        (400003, "Fehlerhafter Datentyp"),
        (400004, "Nachricht konnte nicht gelesen werden"),
        (400005, "Nicht valides Argument"),
        (400006, "Fehlerhafte Anfrage"),
        (400007, "Fehlerhafter Port"),
        (400008, "Keine valide Mengenstückelung"),
        (400009, "Produkt wurde gelöscht"),
        (400010, "Mehrere Produkte mit der gleichen ID"),
        (400011, "Gelöschte Produkte können nicht gekauft werden"),
        (400012, "bis-zum-Datum ist nach dem ab-dem-Datum"),
        (400013, "Report Daten liegen in der Zukunft"),
        (400014, "EMail wird bereits verwendet"),
        (400015, "Benutzername wird bereits verwendet"),
        (400016, "Mitgliedsnummer wird bereits verwendet"),
        (400017, "Benutzer hat bereits eine Rolle"),
        (400018, "Benutzer ist der letzte Admin"),
        (400019, "Produkt ist noch nicht auf Lager"),
        (400020, "Mitglied kann diesen Filter nicht benutzen"),
        (400021, "Produkt ist ausverkauft"),
        (400022, "Benutzer ist nicht aktiv"),
        (400023, "Benutzer wurde gelöscht"),
        (400024, "Ein gelöschtes Produkt kann nicht entsorgt werden"),
        (400025, "Produkt hat keinen Preis"),
        (401001, "Benutzer und Einkauf stimmen nicht überein"),
        (401002, "Ungültiger Token"),
        (401003, "Token ist abgelaufen"),
        (401004, "Benutzername oder Passwort falsch"),
        (401005, "Zugang verweigert"),
        (401006, "Ungültige Token Signatur"),
        (401007, "Legitimationstoken benötigt"),
        (401008, "Refresh Token stimmt nicht mit Benutzer überein"),
        (401009, "Refresh Token ungültig"),
        (404001, "Kein Händler gefunden"),
        (404003, "Produkt nicht gefunden"),
        (404004, "Einkauf nicht gefunden"),
        (404005, "Benutzer nicht gefunden"),
        (404006, "Benutzer hat keine Rolle"),
        (405001, "Methode nicht erlaubt"),
        (406001, "Nicht akzeptierbar"),
        (415001, "Ungültiger Media Type"),
        (500001, "Ein interner Serverfehler ist aufgetreten"),
        (500002, "Fehlende Pfadvariable"),
        (500003, "Konvertierung wird nicht unterstützt"),
        (500004, "Nachricht konnte nicht geschrieben werden"),
        (500008, "Unbekannte Produkt-Klasse"),
        (503001, "Fehler bei der asynchronen Verarbeitung"),
    ])
});

/// Message for `code`, or a generic message naming the code. Never fails.
pub fn translate(code: u32) -> Cow<'static, str> {
    match TRANSLATIONS.get(&code) {
        Some(message) => Cow::Borrowed(*message),
        None => Cow::Owned(format!("Ein unbekannter Fehler ist aufgetreten ({code})")),
    }
}
