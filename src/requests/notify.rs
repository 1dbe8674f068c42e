use std::sync::Arc;

use crate::{
    db::{BuddyRequest, RequestType},
    include_res,
    mail::{Mail, Mailer},
    res,
};

/// One side of a buddy request, as it appears in an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub profile_url: String,
}

/// Sends the emails that accompany request transitions.
#[derive(Clone)]
pub struct Notifier {
    mailer: Mailer,
    site_url: Arc<str>,
}

impl Notifier {
    pub fn new(mailer: Mailer, site_url: &str) -> Self {
        Self {
            mailer,
            site_url: site_url.trim_end_matches('/').into(),
        }
    }

    pub fn profile_url(&self, profile_id: Option<i64>) -> String {
        match profile_id {
            Some(id) => format!("{}/profile/{id}", self.site_url),
            None => format!("{}/search", self.site_url),
        }
    }

    pub fn request_url(&self, request_id: i64) -> String {
        format!("{}/requests/{request_id}", self.site_url)
    }

    /// Delivery failures are logged; the transition that caused them stands.
    async fn deliver(&self, mail: Mail) {
        let to = mail.to.clone();
        if let Err(err) = self.mailer.send(mail).await {
            tracing::error!(%to, error = %err, "notification not delivered");
        }
    }

    pub async fn request_created(
        &self,
        request: &BuddyRequest,
        requestor: &Contact,
        requestee: &Contact,
    ) {
        self.deliver(created_mail(request, requestor, requestee, &self.request_url(request.id)))
            .await;
    }

    pub async fn request_accepted(
        &self,
        request: &BuddyRequest,
        requestor: &Contact,
        requestee: &Contact,
    ) {
        self.deliver(accepted_mail(request, requestor, requestee, &self.request_url(request.id)))
            .await;
    }

    pub async fn request_completed(&self, requestor: &Contact, requestee: &Contact) {
        self.deliver(completed_mail(requestor, requestee)).await;
        self.deliver(completed_mail(requestee, requestor)).await;
    }
}

fn kind_phrase(kind: RequestType) -> &'static str {
    match kind {
        RequestType::Request => "a request for mentorship",
        RequestType::Offer => "an offer of mentorship",
    }
}

pub(crate) fn created_mail(
    request: &BuddyRequest,
    requestor: &Contact,
    requestee: &Contact,
    request_url: &str,
) -> Mail {
    Mail {
        to: requestee.email.clone(),
        reply_to: Some(requestor.email.clone()),
        subject: format!("{} sent you a BuddyRequest", requestor.name),
        body: res::render(
            include_res!(str, "/mail/request_created.txt"),
            &[
                ("name", &requestee.name),
                ("sender", &requestor.name),
                ("kind", kind_phrase(request.request_type)),
                ("message", &request.message),
                ("profile_url", &requestor.profile_url),
                ("request_url", request_url),
            ],
        ),
    }
}

pub(crate) fn accepted_mail(
    request: &BuddyRequest,
    requestor: &Contact,
    requestee: &Contact,
    request_url: &str,
) -> Mail {
    Mail {
        to: requestor.email.clone(),
        reply_to: Some(requestee.email.clone()),
        subject: format!("{} accepted your BuddyRequest", requestee.name),
        body: res::render(
            include_res!(str, "/mail/request_accepted.txt"),
            &[
                ("name", &requestor.name),
                ("accepter", &requestee.name),
                ("kind", request.request_type.noun()),
                ("message", &request.message),
                ("profile_url", &requestee.profile_url),
                ("request_url", request_url),
            ],
        ),
    }
}

/// The email `recipient` gets when their mentorship with `counterpart` ends.
pub(crate) fn completed_mail(recipient: &Contact, counterpart: &Contact) -> Mail {
    Mail {
        to: recipient.email.clone(),
        reply_to: Some(counterpart.email.clone()),
        subject: format!("Your mentorship with {} is complete", counterpart.name),
        body: res::render(
            include_res!(str, "/mail/request_completed.txt"),
            &[
                ("name", &recipient.name),
                ("counterpart", &counterpart.name),
                ("profile_url", &counterpart.profile_url),
            ],
        ),
    }
}
