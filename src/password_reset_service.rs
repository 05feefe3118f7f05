use super::db_types::{ResetToken, Role};
use super::utils::current_time_millis;
use tokio_postgres::GenericClient;

pub async fn add(
    con: &mut impl GenericClient,
    reset_token_key_hash: String,
    role: Role,
    creator_user_id: i64,
    signed_token: String,
) -> Result<ResetToken, tokio_postgres::Error> {
    let creation_time = current_time_millis();

    con.execute(
        "
        INSERT INTO reset_token_t(
            reset_token_key_hash,
            creation_time,
            role,
            creator_user_id,
            signed_token
        ) VALUES ($1, $2, $3, $4, $5)
        ",
        &[
            &reset_token_key_hash,
            &creation_time,
            &role.as_str(),
            &creator_user_id,
            &signed_token,
        ],
    )
    .await?;

    Ok(ResetToken {
        reset_token_key_hash,
        creation_time,
        role,
        creator_user_id,
        signed_token,
    })
}

// records of another role never match
pub async fn get_by_reset_token_key_hash(
    con: &mut impl GenericClient,
    role: Role,
    reset_token_key_hash: &str,
) -> Result<Option<ResetToken>, tokio_postgres::Error> {
    let result = con
        .query_opt(
            "SELECT * FROM reset_token_t WHERE reset_token_key_hash=$1 AND role=$2",
            &[&reset_token_key_hash, &role.as_str()],
        )
        .await?
        .map(|row| ResetToken {
            reset_token_key_hash: row.get("reset_token_key_hash"),
            creation_time: row.get("creation_time"),
            role,
            creator_user_id: row.get("creator_user_id"),
            signed_token: row.get("signed_token"),
        });

    Ok(result)
}

pub async fn delete_by_creator(
    con: &mut impl GenericClient,
    role: Role,
    creator_user_id: i64,
) -> Result<u64, tokio_postgres::Error> {
    con.execute(
        "DELETE FROM reset_token_t WHERE role=$1 AND creator_user_id=$2",
        &[&role.as_str(), &creator_user_id],
    )
    .await
}
