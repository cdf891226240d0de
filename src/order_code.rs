use rand::Rng;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entity::orders::{Column as OrderCol, Entity as Orders};

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SHORT_LEN: usize = 5;
const LONG_LEN: usize = 8;
const MAX_ATTEMPTS: usize = 40;

pub fn random_code(prefix: &str, len: usize) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("{prefix}{suffix}")
}

/// Picks an unused short order code, falling back to a longer one when the
/// short space looks crowded. The unique index is the final arbiter.
pub async fn generate<C: ConnectionTrait>(conn: &C, prefix: &str) -> Result<String, DbErr> {
    for _ in 0..MAX_ATTEMPTS {
        let code = random_code(prefix, SHORT_LEN);
        let taken = Orders::find()
            .filter(OrderCol::OrderCode.eq(code.as_str()))
            .count(conn)
            .await?;
        if taken == 0 {
            return Ok(code);
        }
    }
    tracing::warn!(prefix, "short order codes exhausted, using long form");
    Ok(random_code(prefix, LONG_LEN))
}
