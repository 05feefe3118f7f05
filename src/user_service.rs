use super::db_types::*;
use super::utils::current_time_millis;
use tokio_postgres::GenericClient;
use tokio_postgres::Row;

fn to_user_credential(role: Role, row: Row) -> UserCredential {
    UserCredential {
        user_id: row.get("user_id"),
        creation_time: row.get("creation_time"),
        role,
        email: row.get("email"),
        secondary_id: row.get("secondary_id"),
        password_hash: row.get("password_hash"),
    }
}

pub async fn add(
    con: &mut impl GenericClient,
    role: Role,
    email: String,
    secondary_id: i64,
    password_hash: String,
) -> Result<UserCredential, tokio_postgres::Error> {
    let creation_time = current_time_millis();

    let user_id = con
        .query_one(
            &format!(
                "INSERT INTO {}(
                    creation_time,
                    email,
                    secondary_id,
                    password_hash
                ) VALUES ($1, $2, $3, $4)
                RETURNING user_id",
                role.table()
            ),
            &[&creation_time, &email, &secondary_id, &password_hash],
        )
        .await?
        .get(0);

    Ok(UserCredential {
        user_id,
        creation_time,
        role,
        email,
        secondary_id,
        password_hash,
    })
}

pub async fn get_by_user_id(
    con: &mut impl GenericClient,
    role: Role,
    user_id: i64,
) -> Result<Option<UserCredential>, tokio_postgres::Error> {
    let result = con
        .query_opt(
            &format!("SELECT * FROM {} WHERE user_id=$1", role.table()),
            &[&user_id],
        )
        .await?
        .map(|row| to_user_credential(role, row));

    Ok(result)
}

pub async fn get_by_email(
    con: &mut impl GenericClient,
    role: Role,
    email: &str,
) -> Result<Option<UserCredential>, tokio_postgres::Error> {
    let result = con
        .query_opt(
            &format!("SELECT * FROM {} WHERE email=$1", role.table()),
            &[&email],
        )
        .await?
        .map(|row| to_user_credential(role, row));

    Ok(result)
}

pub async fn get_by_secondary_id(
    con: &mut impl GenericClient,
    role: Role,
    secondary_id: i64,
) -> Result<Option<UserCredential>, tokio_postgres::Error> {
    let result = con
        .query_opt(
            &format!("SELECT * FROM {} WHERE secondary_id=$1", role.table()),
            &[&secondary_id],
        )
        .await?
        .map(|row| to_user_credential(role, row));

    Ok(result)
}

// returns false if no such user exists
pub async fn update_password_hash(
    con: &mut impl GenericClient,
    role: Role,
    user_id: i64,
    password_hash: &str,
) -> Result<bool, tokio_postgres::Error> {
    let count = con
        .execute(
            &format!(
                "UPDATE {} SET password_hash=$1 WHERE user_id=$2",
                role.table()
            ),
            &[&password_hash, &user_id],
        )
        .await?;

    Ok(count != 0)
}
