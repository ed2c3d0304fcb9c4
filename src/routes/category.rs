use crate::types::category::Category;

pub async fn get_categories() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&Category::ALL))
}
