use chrono::Utc;
use rocket::{http::Status, serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::api::{
    auth::{AdminRole, AuthToken},
    results::ElectionResults,
    vote::{CastVoteRequest, CastVoteResponse, VoteSummary},
};
use crate::store::Store;
use crate::voting::{self, Ballot};

pub fn routes() -> Vec<Route> {
    routes![cast_vote, election_results, all_votes]
}

#[post("/votes", data = "<request>", format = "json")]
async fn cast_vote(
    token: AuthToken,
    request: Json<CastVoteRequest>,
    store: &State<Store>,
) -> Result<(Status, Json<CastVoteResponse>)> {
    let ballot = Ballot::parse(&request)?;
    if !token.may_act_for(ballot.voter_id) {
        return Err(Error::Forbidden(format!(
            "{} may not vote on behalf of {}",
            token.id, ballot.voter_id
        )));
    }

    let receipt = voting::cast_ballot(store.inner().as_ref(), ballot, Utc::now()).await?;
    Ok((Status::Created, Json(receipt.into())))
}

#[get("/votes/results/<election_id>")]
async fn election_results(
    _token: AuthToken,
    election_id: &str,
    store: &State<Store>,
) -> Result<Json<ElectionResults>> {
    let results = voting::results(store.inner().as_ref(), election_id, Utc::now()).await?;
    Ok(Json(results))
}

#[get("/votes")]
async fn all_votes(
    _token: AuthToken<AdminRole>,
    store: &State<Store>,
) -> Result<Json<Vec<VoteSummary>>> {
    let votes = voting::list_votes(store.inner().as_ref()).await?;
    Ok(Json(votes))
}
