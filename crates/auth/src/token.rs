//! Signierte Session-Tokens (HS256)
//!
//! Stellt kompakte, symmetrisch signierte Tokens aus (Header/Claims/Signatur)
//! und prueft sie. Das Signiergeheimnis wird einmal beim Start injiziert und
//! ist danach unveraenderlich – es gibt keinen globalen veraenderbaren Zustand.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use pfoertner_core::BenutzerId;

use crate::error::{AuthError, AuthResult};

/// Die im Token eingebetteten Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Benutzer-ID als String (Subjekt)
    pub sub: String,
    pub username: String,
    #[serde(rename = "roles")]
    pub rollen: Vec<String>,
    /// Ausstellungszeitpunkt (Unix-Sekunden)
    pub iat: i64,
    /// Ablaufzeitpunkt (Unix-Sekunden)
    pub exp: i64,
}

impl TokenClaims {
    /// Die Benutzer-ID aus dem Subjekt-Claim
    pub fn benutzer_id(&self) -> AuthResult<BenutzerId> {
        self.sub
            .parse()
            .map_err(|_| AuthError::TokenFehlerhaft(format!("Subjekt '{}' keine ID", self.sub)))
    }
}

/// Token-Dienst: stellt Tokens aus und prueft sie
///
/// Akzeptiert ausschliesslich HS256 – ein Token mit abweichendem
/// Algorithmus im Header wird abgelehnt (Schutz gegen Algorithmus-Tausch).
pub struct TokenDienst {
    kodier_schluessel: EncodingKey,
    dekodier_schluessel: DecodingKey,
    gueltigkeit: Duration,
}

impl TokenDienst {
    /// Erstellt einen neuen Token-Dienst mit dem gegebenen Geheimnis und TTL
    pub fn neu(geheimnis: &str, gueltigkeit: Duration) -> Self {
        Self {
            kodier_schluessel: EncodingKey::from_secret(geheimnis.as_bytes()),
            dekodier_schluessel: DecodingKey::from_secret(geheimnis.as_bytes()),
            gueltigkeit,
        }
    }

    /// Die konfigurierte Token-Lebensdauer
    ///
    /// Dieselbe Dauer gilt fuer den Registereintrag – eine Quelle fuer beide.
    pub fn gueltigkeit(&self) -> Duration {
        self.gueltigkeit
    }

    /// Stellt ein neues Token fuer den Benutzer aus
    ///
    /// `iat` ist der Ausstellungszeitpunkt – zwei Ausstellungen zu
    /// verschiedenen Zeitpunkten ergeben verschiedene Tokens, Ergebnisse
    /// werden nie zwischengespeichert.
    pub fn ausstellen(
        &self,
        id: BenutzerId,
        username: &str,
        rollen: &[String],
    ) -> AuthResult<String> {
        let jetzt = Utc::now();
        let claims = TokenClaims {
            sub: id.inner().to_string(),
            username: username.to_string(),
            rollen: rollen.to_vec(),
            iat: jetzt.timestamp(),
            exp: (jetzt + self.gueltigkeit).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.kodier_schluessel)
            .map_err(|e| AuthError::intern(format!("Token-Signierung fehlgeschlagen: {e}")))
    }

    /// Prueft Signatur und Ablauf eines Tokens und gibt die Claims zurueck
    pub fn pruefen(&self, token: &str) -> AuthResult<TokenClaims> {
        let validation = Validation::new(Algorithm::HS256);

        match decode::<TokenClaims>(token, &self.dekodier_schluessel, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => Err(match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenAbgelaufen,
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::TokenUngueltig
                }
                _ => AuthError::TokenFehlerhaft(e.to_string()),
            }),
        }
    }

    /// Schnelle Ja/Nein-Pruefung ohne Claims-Rueckgabe
    pub fn ist_gueltig(&self, token: &str) -> bool {
        self.pruefen(token).is_ok()
    }
}
